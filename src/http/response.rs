//! Client response construction.
//!
//! Every terminal pipeline state maps to one builder here. Origin headers are
//! copied end-to-end only; `Content-Length` is recomputed from the buffered body.

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::Bytes;

use crate::http::headers::end_to_end;
use crate::origin::OriginResponse;

pub const NOT_FOUND_BODY: &str = "Not Found";
pub const ERROR_BODY: &str = "An error occurred";

/// Content type used when a cached object carries none.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Redirect to `target` with `status`.
pub fn redirect(target: &str, status: StatusCode) -> Response<Body> {
    match HeaderValue::from_str(target) {
        Ok(location) => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(header::LOCATION, location);
            response
        }
        Err(_) => {
            tracing::warn!(target = %target, "Redirect target is not a valid Location header");
            internal_error()
        }
    }
}

/// 200 with a body served from the object store.
pub fn cached(body: Bytes, content_type: Option<&str>, cache_control: &HeaderValue) -> Response<Body> {
    let content_type = content_type
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE));

    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CACHE_CONTROL, cache_control.clone());
    response
}

/// The origin's response, optionally with `Cache-Control` replaced.
pub fn from_origin(origin: OriginResponse, cache_control: Option<&HeaderValue>) -> Response<Body> {
    let mut headers = end_to_end(&origin.headers);
    headers.remove(header::CONTENT_LENGTH);
    if let Some(value) = cache_control {
        headers.insert(header::CACHE_CONTROL, value.clone());
    }

    let mut response = Response::new(Body::from(origin.body));
    *response.status_mut() = origin.status;
    *response.headers_mut() = headers;
    response
}

pub fn not_found() -> Response<Body> {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

pub fn internal_error() -> Response<Body> {
    (StatusCode::INTERNAL_SERVER_ERROR, ERROR_BODY).into_response()
}
