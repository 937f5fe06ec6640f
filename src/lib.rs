#![doc(html_root_url = "https://docs.rs/tower-supersede/0.1.0")]
#![warn(
    missing_debug_implementations,
    missing_docs,
    rust_2018_idioms,
    unreachable_pub
)]
#![cfg_attr(test, deny(warnings))]

//! Tower middleware that keeps only the latest request per identity in
//! flight.
//!
//! Interactive clients (type-ahead search, filtered lists) often fire a new
//! request before the previous one has answered, and only the newest answer
//! matters. [`Supersede`] tracks requests by a caller-assigned identity: when
//! a request arrives for an identity that already has one in flight, the
//! older request is cancelled and its response future resolves with
//! [`error::Canceled`]. Requests without an identity pass straight through.
//!
//! When the inner service sits on top of a cache, a request identical to the
//! one in flight (same identity and same canonical key) is expected to be
//! answered from that cache. If the request is cache-eligible, it is passed
//! through untracked instead of cancelling the original.
//!
//! ```
//! use tower_supersede::{Request, SupersedeLayer};
//!
//! let layer = SupersedeLayer::new().cache_by_default(true);
//! let request = Request::new("/search")
//!     .with_param("q", "ru")
//!     .with_identity("search-box");
//! # let _ = (layer, request);
//! ```
//!
//! Tracked requests carry a [`CancellationToken`] (see
//! [`Descriptor::set_cancellation`]) so the inner service can abort its own
//! work early. The response future also watches the token and drops the
//! inner future as soon as it is cancelled.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod error;
pub mod future;
pub mod key;
mod layer;
pub mod request;
mod service;
mod tracker;

pub use self::error::BoxError;
pub use self::key::{Canonicalize, ParamsSerializer, SortedUrl};
pub use self::layer::SupersedeLayer;
pub use self::request::{Descriptor, Request};
pub use self::service::Supersede;
pub use self::tracker::Tracker;
pub use tokio_util::sync::CancellationToken;
