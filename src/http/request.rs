//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract routing-relevant information (target)
//! - Prepare request for forwarding to the upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Extensions are not forwarded; the upgrade handle stays with the client side

use axum::body::Body;
use axum::http::header::{HeaderValue, HOST};
use axum::http::{request, HeaderName, Request, Version};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::headers::strip_hop_by_hop;
use crate::routing::RouteMatch;

/// Header carrying the correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a v4 UUID to requests arriving without `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Correlation ID of a request, `unknown` when absent.
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Path and query as received, `/` when the request line carried neither.
pub fn target<B>(request: &Request<B>) -> String {
    request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .filter(|pq| !pq.is_empty())
        .unwrap_or("/")
        .to_string()
}

/// Build the request sent upstream.
///
/// Method, headers and body carry over; the URI points at the upstream with
/// the rewritten target. Hop-by-hop headers are dropped unless the exchange
/// is an upgrade handshake.
pub fn upstream_request(
    parts: request::Parts,
    body: Body,
    route: &RouteMatch<'_>,
    change_origin: bool,
    upgrade: bool,
) -> Result<Request<Body>, axum::http::Error> {
    let mut headers = parts.headers;
    if !upgrade {
        strip_hop_by_hop(&mut headers);
    }

    let host = if change_origin {
        Some(route.upstream.authority().as_str())
    } else if headers.contains_key(HOST) {
        None
    } else {
        // HTTP/2 clients send :authority instead of Host.
        parts.uri.authority().map(|a| a.as_str())
    };
    if let Some(host) = host {
        headers.insert(HOST, HeaderValue::from_str(host)?);
    }

    let mut forwarded = Request::builder()
        .method(parts.method)
        .version(Version::HTTP_11)
        .uri(route.upstream.uri_for(&route.target)?)
        .body(body)?;
    *forwarded.headers_mut() = headers;
    Ok(forwarded)
}
