use tower_layer::Layer;

use crate::key::SortedUrl;
use crate::service::Supersede;
use crate::tracker::Tracker;

/// Wraps services in [`Supersede`] middleware.
///
/// By default every wrapped service gets its own tracking table. A layer
/// built with [`with_tracker`](SupersedeLayer::with_tracker) hands the same
/// table to every service it wraps, so their requests supersede each other.
#[derive(Clone, Debug)]
pub struct SupersedeLayer<K = SortedUrl> {
    tracker: Option<Tracker>,
    canonicalize: K,
    cache_by_default: bool,
}

impl SupersedeLayer {
    /// Creates a new layer.
    pub fn new() -> Self {
        SupersedeLayer {
            tracker: None,
            canonicalize: SortedUrl,
            cache_by_default: false,
        }
    }

    /// Creates a layer whose services all share `tracker`.
    pub fn with_tracker(tracker: Tracker) -> Self {
        SupersedeLayer {
            tracker: Some(tracker),
            ..SupersedeLayer::new()
        }
    }
}

impl<K> SupersedeLayer<K> {
    /// Treat every request as cache-eligible unless it says otherwise.
    pub fn cache_by_default(mut self, enabled: bool) -> Self {
        self.cache_by_default = enabled;
        self
    }

    /// Compute canonical keys with `canonicalize` instead of [`SortedUrl`].
    pub fn canonicalize_with<K2>(self, canonicalize: K2) -> SupersedeLayer<K2> {
        SupersedeLayer {
            tracker: self.tracker,
            canonicalize,
            cache_by_default: self.cache_by_default,
        }
    }
}

impl Default for SupersedeLayer {
    fn default() -> Self {
        SupersedeLayer::new()
    }
}

impl<S, K: Clone> Layer<S> for SupersedeLayer<K> {
    type Service = Supersede<S, K>;

    fn layer(&self, service: S) -> Self::Service {
        let tracker = self.tracker.clone().unwrap_or_default();
        Supersede::from_parts(
            service,
            tracker,
            self.canonicalize.clone(),
            self.cache_by_default,
        )
    }
}
