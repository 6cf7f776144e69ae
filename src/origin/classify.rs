//! Origin response classification.

use axum::http::{header, StatusCode};

use super::OriginResponse;

/// What to do with an origin response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Remember the redirect under the request's key and send the client there.
    Redirect { target: String, status: StatusCode },
    /// Store the body, then return it.
    Cacheable,
    /// Return as is, store nothing.
    PassThrough,
}

/// Decide how an origin response is handled.
///
/// A redirect the client already followed wins over everything else, then an
/// unfollowed 301/302 with a `Location`, then 2xx on a cacheable path.
pub fn classify(response: &OriginResponse, cacheable_path: bool) -> Classification {
    if let Some(followed) = &response.followed {
        return Classification::Redirect {
            target: followed.url.clone(),
            status: followed.status,
        };
    }

    if matches!(response.status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND) {
        if let Some(location) = response
            .headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            return Classification::Redirect {
                target: location.to_string(),
                status: response.status,
            };
        }
    }

    if response.ok() && cacheable_path {
        Classification::Cacheable
    } else {
        Classification::PassThrough
    }
}
