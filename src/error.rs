//! Error types

use std::{error, fmt};

/// Alias for a type-erased error type.
pub type BoxError = Box<dyn error::Error + Send + Sync>;

/// The request was superseded by a newer request with the same identity.
///
/// Callers should treat this as "stale, ignore me" rather than as a failure
/// to show to a user. When the inner service surfaced its own error after
/// observing the cancellation, that error is available through
/// [`source`](error::Error::source).
#[derive(Debug)]
pub struct Canceled {
    source: Option<BoxError>,
}

impl Canceled {
    pub(crate) fn new() -> Self {
        Canceled { source: None }
    }

    pub(crate) fn with_source(source: BoxError) -> Self {
        Canceled {
            source: Some(source),
        }
    }

    /// Always `true`; lets callers that only hold a `Canceled` branch on it
    /// the same way they would on a flag.
    pub fn is_canceled(&self) -> bool {
        true
    }
}

/// Returns `true` if `err` was produced because its request was superseded.
pub fn is_canceled(err: &BoxError) -> bool {
    err.is::<Canceled>()
}

impl fmt::Display for Canceled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("request superseded by a newer request")
    }
}

impl error::Error for Canceled {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.source {
            Some(ref err) => Some(&**err),
            None => None,
        }
    }
}
