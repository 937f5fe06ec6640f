//! Canonical request keys.
//!
//! Two requests with the same identity are considered duplicates when their
//! canonical keys are equal. The key is computed from the request path, its
//! query parameters and the rule used to serialize those parameters.

use std::fmt;
use std::sync::Arc;

use url::form_urlencoded;

/// Rule used to turn query parameters into a query string.
#[derive(Clone)]
pub enum ParamsSerializer {
    /// `application/x-www-form-urlencoded` encoding.
    Standard,
    /// A caller-provided encoder. It receives the parameters in their
    /// original order and returns the query string without a leading `?`.
    Custom(Arc<dyn Fn(&[(String, String)]) -> String + Send + Sync>),
}

impl ParamsSerializer {
    /// Wraps `f` as a custom serializer.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[(String, String)]) -> String + Send + Sync + 'static,
    {
        ParamsSerializer::Custom(Arc::new(f))
    }

    /// Serializes `params` into a query string.
    pub fn serialize(&self, params: &[(String, String)]) -> String {
        match self {
            ParamsSerializer::Standard => form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish(),
            ParamsSerializer::Custom(f) => f(params),
        }
    }
}

impl Default for ParamsSerializer {
    fn default() -> Self {
        ParamsSerializer::Standard
    }
}

impl fmt::Debug for ParamsSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamsSerializer::Standard => f.write_str("Standard"),
            ParamsSerializer::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Computes the comparison key for a request.
///
/// Implementations must be pure: the same inputs always produce the same key.
pub trait Canonicalize {
    /// Returns the canonical key for `path` and `params` serialized with
    /// `serializer`.
    fn canonicalize(
        &self,
        path: &str,
        params: &[(String, String)],
        serializer: &ParamsSerializer,
    ) -> String;
}

impl<F> Canonicalize for F
where
    F: Fn(&str, &[(String, String)], &ParamsSerializer) -> String,
{
    fn canonicalize(
        &self,
        path: &str,
        params: &[(String, String)],
        serializer: &ParamsSerializer,
    ) -> String {
        self(path, params, serializer)
    }
}

/// The default [`Canonicalize`] implementation.
///
/// Builds the full URL (path plus serialized parameters, fragment removed)
/// and sorts the `&`-separated pieces of its query string, so the key does
/// not depend on parameter order.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortedUrl;

impl Canonicalize for SortedUrl {
    fn canonicalize(
        &self,
        path: &str,
        params: &[(String, String)],
        serializer: &ParamsSerializer,
    ) -> String {
        let path = match path.find('#') {
            Some(idx) => &path[..idx],
            None => path,
        };

        let serialized = if params.is_empty() {
            String::new()
        } else {
            serializer.serialize(params)
        };

        let (base, query) = match path.find('?') {
            Some(idx) => (&path[..idx], join_query(&path[idx + 1..], &serialized)),
            None => (path, serialized),
        };

        if query.is_empty() {
            return base.to_owned();
        }

        let mut pieces: Vec<&str> = query.split('&').collect();
        pieces.sort_unstable();

        let mut key = String::with_capacity(base.len() + query.len() + 1);
        key.push_str(base);
        key.push('?');
        key.push_str(&pieces.join("&"));
        key
    }
}

fn join_query(existing: &str, serialized: &str) -> String {
    match (existing.is_empty(), serialized.is_empty()) {
        (true, _) => serialized.to_owned(),
        (false, true) => existing.to_owned(),
        (false, false) => format!("{}&{}", existing, serialized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn key(path: &str, pairs: &[(&str, &str)]) -> String {
        SortedUrl.canonicalize(path, &params(pairs), &ParamsSerializer::Standard)
    }

    #[test]
    fn no_params_is_the_path() {
        assert_eq!(key("/search", &[]), "/search");
    }

    #[test]
    fn params_are_sorted() {
        assert_eq!(
            key("/search", &[("q", "a"), ("page", "2")]),
            "/search?page=2&q=a"
        );
        assert_eq!(
            key("/search", &[("q", "a"), ("page", "2")]),
            key("/search", &[("page", "2"), ("q", "a")]),
        );
    }

    #[test]
    fn merges_existing_query() {
        assert_eq!(
            key("/search?z=1&b=2", &[("a", "3")]),
            "/search?a=3&b=2&z=1"
        );
        assert_eq!(key("/search?z=1&b=2", &[]), "/search?b=2&z=1");
    }

    #[test]
    fn fragment_is_dropped() {
        assert_eq!(key("/search#top", &[("q", "a")]), "/search?q=a");
    }

    #[test]
    fn values_are_encoded() {
        assert_eq!(key("/search", &[("q", "a b&c")]), "/search?q=a+b%26c");
    }

    #[test]
    fn different_values_differ() {
        assert_ne!(key("/search", &[("q", "a")]), key("/search", &[("q", "ab")]));
    }

    #[test]
    fn custom_serializer() {
        let serializer = ParamsSerializer::custom(|params| {
            params
                .iter()
                .map(|(k, v)| format!("{}:{}", k, v))
                .collect::<Vec<_>>()
                .join("&")
        });
        let key = SortedUrl.canonicalize("/items", &params(&[("b", "1"), ("a", "2")]), &serializer);
        assert_eq!(key, "/items?a:2&b:1");
    }

    #[test]
    fn closures_canonicalize() {
        let by_path = |path: &str, _: &[(String, String)], _: &ParamsSerializer| path.to_owned();
        assert_eq!(
            by_path.canonicalize("/x", &params(&[("q", "a")]), &ParamsSerializer::Standard),
            "/x"
        );
    }
}
