//! Future types

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::ready;
use pin_project_lite::pin_project;
use tokio_util::sync::WaitForCancellationFutureOwned;

use crate::error::{BoxError, Canceled};
use crate::tracker::Registration;

pin_project! {
    /// Response future for [`Supersede`](crate::Supersede).
    pub struct ResponseFuture<F> {
        #[pin]
        kind: Kind<F>,
    }
}

pin_project! {
    #[project = KindProj]
    enum Kind<F> {
        Untracked {
            #[pin]
            future: F,
        },
        Tracked {
            #[pin]
            future: F,
            #[pin]
            canceled: WaitForCancellationFutureOwned,
            registration: Option<Registration>,
        },
        // The executor future and the entry are gone once a tracked call
        // resolves.
        Done,
    }
}

impl<F> ResponseFuture<F> {
    pub(crate) fn untracked(future: F) -> Self {
        ResponseFuture {
            kind: Kind::Untracked { future },
        }
    }

    pub(crate) fn tracked(future: F, registration: Registration) -> Self {
        let canceled = registration.cancellation().clone().cancelled_owned();
        ResponseFuture {
            kind: Kind::Tracked {
                future,
                canceled,
                registration: Some(registration),
            },
        }
    }
}

impl<F, T, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, E>>,
    E: Into<BoxError>,
{
    type Output = Result<T, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut kind = self.project().kind;

        let output = match kind.as_mut().project() {
            KindProj::Untracked { future } => {
                return Poll::Ready(ready!(future.poll(cx)).map_err(Into::into));
            }
            KindProj::Tracked {
                future,
                canceled,
                registration,
            } => match future.poll(cx) {
                Poll::Ready(result) => {
                    let superseded = registration
                        .take()
                        .map_or(false, |registration| registration.is_canceled());

                    if superseded {
                        tracing::trace!("discarding response of superseded request");
                        let err = match result {
                            Ok(_) => Canceled::new(),
                            Err(e) => Canceled::with_source(e.into()),
                        };
                        Err(err.into())
                    } else {
                        result.map_err(Into::into)
                    }
                }
                Poll::Pending => {
                    ready!(canceled.poll(cx));
                    tracing::trace!("request superseded while in flight");
                    Err(Canceled::new().into())
                }
            },
            KindProj::Done => panic!("polled after complete"),
        };

        kind.set(Kind::Done);
        Poll::Ready(output)
    }
}

impl<F> fmt::Debug for ResponseFuture<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tracked = matches!(self.kind, Kind::Tracked { .. });
        f.debug_struct("ResponseFuture")
            .field("tracked", &tracked)
            .finish()
    }
}
