use std::task::{Context, Poll};

use tower_service::Service;

use crate::error::BoxError;
use crate::future::ResponseFuture;
use crate::key::{Canonicalize, SortedUrl};
use crate::request::Descriptor;
use crate::tracker::Tracker;

/// Keeps at most one request per identity in flight, cancelling the older
/// request when a newer one with the same identity is called.
///
/// Clones share the same [`Tracker`].
#[derive(Clone, Debug)]
pub struct Supersede<S, K = SortedUrl> {
    inner: S,
    tracker: Tracker,
    canonicalize: K,
    cache_by_default: bool,
}

// ===== impl Supersede =====

impl<S> Supersede<S> {
    /// Wraps `inner` with a fresh tracking table and the default
    /// [`SortedUrl`] key.
    pub fn new(inner: S) -> Self {
        Supersede::with_tracker(inner, Tracker::new())
    }

    /// Wraps `inner`, tracking requests in the provided table.
    pub fn with_tracker(inner: S, tracker: Tracker) -> Self {
        Supersede {
            inner,
            tracker,
            canonicalize: SortedUrl,
            cache_by_default: false,
        }
    }
}

impl<S, K> Supersede<S, K> {
    /// Treat every request as cache-eligible unless it says otherwise.
    pub fn cache_by_default(mut self, enabled: bool) -> Self {
        self.cache_by_default = enabled;
        self
    }

    /// Compute canonical keys with `canonicalize` instead.
    pub fn canonicalize_with<K2>(self, canonicalize: K2) -> Supersede<S, K2> {
        Supersede {
            inner: self.inner,
            tracker: self.tracker,
            canonicalize,
            cache_by_default: self.cache_by_default,
        }
    }

    pub(crate) fn from_parts(
        inner: S,
        tracker: Tracker,
        canonicalize: K,
        cache_by_default: bool,
    ) -> Self {
        Supersede {
            inner,
            tracker,
            canonicalize,
            cache_by_default,
        }
    }

    /// The table of in-flight requests.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Get a reference to the inner service
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner service
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume `self`, returning the inner service
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S, K, Request> Service<Request> for Supersede<S, K>
where
    S: Service<Request>,
    S::Error: Into<BoxError>,
    K: Canonicalize,
    Request: Descriptor,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut request: Request) -> Self::Future {
        let identity = request
            .identity()
            .filter(|identity| !identity.is_empty())
            .map(str::to_owned);

        let identity = match identity {
            Some(identity) => identity,
            None => {
                tracing::trace!("no identity; passing through");
                return ResponseFuture::untracked(self.inner.call(request));
            }
        };

        let canonical_key = self.canonicalize.canonicalize(
            &request.path(),
            &request.params(),
            request.params_serializer(),
        );
        let cache_eligible = request.cache().unwrap_or(self.cache_by_default);

        match self
            .tracker
            .register(&identity, canonical_key, cache_eligible)
        {
            Some(registration) => {
                request.set_cancellation(registration.cancellation().clone());
                ResponseFuture::tracked(self.inner.call(request), registration)
            }
            None => ResponseFuture::untracked(self.inner.call(request)),
        }
    }
}
