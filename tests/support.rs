#![allow(dead_code)]

use tower_supersede::Request;

pub(crate) fn trace_init() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .with_thread_names(true)
        .finish();
    tracing::subscriber::set_default(subscriber)
}

/// A `/search` request for `query`, tracked under `identity`.
pub(crate) fn search(identity: &str, query: &str) -> Request {
    Request::new("/search")
        .with_param("q", query)
        .with_identity(identity)
}
