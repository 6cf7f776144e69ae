//! HTTP origin client.
//!
//! Forwards requests to the configured origin address with the client's
//! `Host` header intact, so name-based origins see the public site.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use bytes::Bytes;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use super::{FollowedRedirect, Origin, OriginError, OriginResponse};
use crate::config::OriginConfig;
use crate::http::headers::end_to_end;
use crate::storage::redirects::is_redirect_status;

/// Origin reached over plain HTTP with a pooled hyper client.
pub struct HttpOrigin {
    client: Client<HttpConnector, Body>,
    authority: Authority,
    timeout_secs: u64,
    follow_redirects: bool,
    max_redirects: usize,
    max_body_bytes: usize,
}

impl HttpOrigin {
    pub fn new(config: &OriginConfig) -> Result<Self, InvalidUri> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeout_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            client,
            authority: Authority::from_str(&config.address)?,
            timeout_secs: config.timeout_secs,
            follow_redirects: config.follow_redirects,
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
        })
    }

    fn upstream_uri(&self, path_and_query: &str) -> Result<Uri, axum::http::Error> {
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    async fn bounded<F>(&self, exchange: F) -> Result<OriginResponse, OriginError>
    where
        F: std::future::Future<Output = Result<OriginResponse, OriginError>>,
    {
        match tokio::time::timeout(Duration::from_secs(self.timeout_secs), exchange).await {
            Ok(result) => result,
            Err(_) => Err(OriginError::Timeout(self.timeout_secs)),
        }
    }

    async fn send(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<OriginResponse, OriginError> {
        let mut request = Request::builder()
            .method(method)
            .uri(self.upstream_uri(path_and_query)?);
        if let Some(out) = request.headers_mut() {
            *out = end_to_end(headers);
        }
        let request = request.body(Body::from(body))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| OriginError::Transport(e.to_string()))?;

        let (parts, body) = response.into_parts();
        let body = axum::body::to_bytes(Body::new(body), self.max_body_bytes)
            .await
            .map_err(|e| OriginError::Body(e.to_string()))?;

        Ok(OriginResponse::new(parts.status, parts.headers, body))
    }

    async fn exchange(&self, request: Request<Bytes>, follow: bool) -> Result<OriginResponse, OriginError> {
        let (parts, body) = request.into_parts();
        let mut path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let mut method = parts.method;
        let mut headers = parts.headers;
        let mut body = body;
        let mut response = self.send(method.clone(), &path_and_query, &headers, body.clone()).await?;

        if !follow || !self.follow_redirects {
            return Ok(response);
        }

        let site_host = headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| Authority::from_str(h).ok())
            .map(|a| a.host().to_ascii_lowercase())
            .unwrap_or_else(|| self.authority.host().to_ascii_lowercase());
        let origin_host = self.authority.host().to_ascii_lowercase();

        let mut first_status = None;
        let mut hops = 0;
        while is_redirect_status(response.status) {
            let Some(next) = response
                .headers
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| {
                    same_site_target(
                        &site_host,
                        &path_and_query,
                        location,
                        &[site_host.as_str(), origin_host.as_str()],
                    )
                })
            else {
                break;
            };

            if hops == self.max_redirects {
                // Chain too long: hand back the last redirect unfollowed.
                return Ok(response);
            }
            hops += 1;
            first_status.get_or_insert(response.status);

            if response.status == StatusCode::SEE_OTHER
                || (method == Method::POST
                    && matches!(response.status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND))
            {
                method = Method::GET;
                body = Bytes::new();
                headers.remove(header::CONTENT_LENGTH);
                headers.remove(header::CONTENT_TYPE);
            }

            tracing::debug!(from = %path_and_query, to = %next, status = %response.status, "Following origin redirect");
            path_and_query = next;
            response = self.send(method.clone(), &path_and_query, &headers, body.clone()).await?;
        }

        if let Some(status) = first_status {
            response.followed = Some(FollowedRedirect {
                url: path_and_query,
                status,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError> {
        self.bounded(self.exchange(request, true)).await
    }

    async fn forward(&self, request: Request<Bytes>) -> Result<OriginResponse, OriginError> {
        self.bounded(self.exchange(request, false)).await
    }
}

/// Resolve `location` against the current path and return its path+query when
/// it points back at one of `hosts`. Off-site targets return `None`.
fn same_site_target(site_host: &str, current: &str, location: &str, hosts: &[&str]) -> Option<String> {
    let base = Url::parse(&format!("http://{}{}", site_host, current)).ok()?;
    let target = base.join(location).ok()?;

    if !matches!(target.scheme(), "http" | "https") {
        return None;
    }
    let host = target.host_str()?.to_ascii_lowercase();
    if !hosts.iter().any(|h| *h == host) {
        return None;
    }

    Some(match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string(),
    })
}
