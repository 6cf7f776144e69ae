//! Cache key derivation.

use std::fmt;
use std::str::FromStr;

use axum::http::{header, uri::Authority, Request};

/// `hostname + path + ?query` of a request.
///
/// The hostname is lower-cased and carries no port; an empty query adds
/// nothing, so `/a?` and `/a` share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(host: &str, path: &str, query: Option<&str>) -> Self {
        let hostname = Authority::from_str(host)
            .map(|a| a.host().to_ascii_lowercase())
            .unwrap_or_else(|_| host.to_ascii_lowercase());

        let mut key = String::with_capacity(hostname.len() + path.len() + 1);
        key.push_str(&hostname);
        key.push_str(path);
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            key.push('?');
            key.push_str(query);
        }
        Self(key)
    }

    /// Key for a request, taking the host from an absolute URI or the `Host` header.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let uri = request.uri();
        let host = uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| {
                request
                    .headers()
                    .get(header::HOST)
                    .and_then(|h| h.to_str().ok())
            })
            .unwrap_or("");

        Self::new(host, uri.path(), uri.query())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
