//! Request descriptors understood by [`Supersede`](crate::Supersede).

use std::borrow::Cow;

use tokio_util::sync::CancellationToken;

use crate::key::ParamsSerializer;

/// A request that can be tracked by identity.
///
/// The guard reads the identity, cache flag and canonical-key inputs from the
/// request, and attaches the cancellation token of tracked requests through
/// [`set_cancellation`](Descriptor::set_cancellation) before handing the
/// request to the inner service.
pub trait Descriptor {
    /// Request path, possibly carrying a query string. Absolute URLs keep
    /// their scheme and host so requests to different origins never share a
    /// canonical key.
    fn path(&self) -> Cow<'_, str>;

    /// Query parameters that are serialized after the path.
    fn params(&self) -> Cow<'_, [(String, String)]>;

    /// How [`params`](Descriptor::params) are turned into a query string.
    fn params_serializer(&self) -> &ParamsSerializer;

    /// The logical identity of the request. `None` or an empty string
    /// disables the guard for this request.
    fn identity(&self) -> Option<&str>;

    /// Explicit cache eligibility. `None` defers to the guard's default.
    fn cache(&self) -> Option<bool>;

    /// Attaches the token that is cancelled when this request is superseded.
    fn set_cancellation(&mut self, token: CancellationToken);
}

/// A plain request descriptor carrying an arbitrary body.
#[derive(Clone, Debug, Default)]
pub struct Request<B = ()> {
    path: String,
    params: Vec<(String, String)>,
    params_serializer: ParamsSerializer,
    identity: Option<String>,
    cache: Option<bool>,
    cancellation: Option<CancellationToken>,
    body: B,
}

impl Request<()> {
    /// Creates a request for `path` with no body.
    pub fn new(path: impl Into<String>) -> Self {
        Request {
            path: path.into(),
            params: Vec::new(),
            params_serializer: ParamsSerializer::Standard,
            identity: None,
            cache: None,
            cancellation: None,
            body: (),
        }
    }
}

impl<B> Request<B> {
    /// Appends a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Sets the parameter serialization rule.
    pub fn with_params_serializer(mut self, serializer: ParamsSerializer) -> Self {
        self.params_serializer = serializer;
        self
    }

    /// Sets the identity used to supersede older requests.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Marks the request as cache-eligible (or explicitly not).
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the body.
    pub fn with_body<T>(self, body: T) -> Request<T> {
        Request {
            path: self.path,
            params: self.params,
            params_serializer: self.params_serializer,
            identity: self.identity,
            cache: self.cache,
            cancellation: self.cancellation,
            body,
        }
    }

    /// The token attached by the guard, if this request is tracked.
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    /// Returns a reference to the body.
    pub fn get_body(&self) -> &B {
        &self.body
    }

    /// Consumes the request, returning the body.
    pub fn into_body(self) -> B {
        self.body
    }
}

impl<B> Descriptor for Request<B> {
    fn path(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.path)
    }

    fn params(&self) -> Cow<'_, [(String, String)]> {
        Cow::Borrowed(self.params.as_slice())
    }

    fn params_serializer(&self) -> &ParamsSerializer {
        &self.params_serializer
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn cache(&self) -> Option<bool> {
        self.cache
    }

    fn set_cancellation(&mut self, token: CancellationToken) {
        self.cancellation = Some(token);
    }
}

#[cfg(feature = "http")]
pub use self::http_support::{CacheHint, Identity};

#[cfg(feature = "http")]
mod http_support {
    use super::Descriptor;
    use crate::key::ParamsSerializer;
    use std::borrow::Cow;
    use tokio_util::sync::CancellationToken;
    use url::form_urlencoded;

    static STANDARD: ParamsSerializer = ParamsSerializer::Standard;

    /// Request extension naming the identity of an `http::Request`.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct Identity(pub String);

    /// Request extension carrying the explicit cache flag of an
    /// `http::Request`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CacheHint(pub bool);

    /// The URI scheme, authority and path form the request path and the URI
    /// query supplies the parameters. The cancellation token is inserted
    /// into the extensions.
    impl<B> Descriptor for http::Request<B> {
        fn path(&self) -> Cow<'_, str> {
            let uri = self.uri();
            match (uri.scheme_str(), uri.authority()) {
                (Some(scheme), Some(authority)) => {
                    Cow::Owned(format!("{}://{}{}", scheme, authority, uri.path()))
                }
                _ => Cow::Borrowed(uri.path()),
            }
        }

        fn params(&self) -> Cow<'_, [(String, String)]> {
            let params = match self.uri().query() {
                Some(query) => form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect(),
                None => Vec::new(),
            };
            Cow::Owned(params)
        }

        fn params_serializer(&self) -> &ParamsSerializer {
            &STANDARD
        }

        fn identity(&self) -> Option<&str> {
            self.extensions()
                .get::<Identity>()
                .map(|identity| identity.0.as_str())
        }

        fn cache(&self) -> Option<bool> {
            self.extensions().get::<CacheHint>().map(|hint| hint.0)
        }

        fn set_cancellation(&mut self, token: CancellationToken) {
            self.extensions_mut().insert(token);
        }
    }
}
