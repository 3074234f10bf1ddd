//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hand the upstream response back to the client as a stream
//! - Strip hop-by-hop headers (except on 101 handshakes)
//! - Map gateway-side failures to plain-text status responses
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Upstream unreachable → 502, no response head in time → 504

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::headers::strip_hop_by_hop;
use crate::upstream::UpstreamError;

pub const BAD_GATEWAY_BODY: &str = "Bad Gateway: Service temporarily unavailable";
pub const GATEWAY_TIMEOUT_BODY: &str = "Gateway Timeout: Upstream did not respond in time";
pub const INTERNAL_ERROR_BODY: &str = "Internal Server Error: No route configured";

/// Pass an upstream response through to the client.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    if parts.status != StatusCode::SWITCHING_PROTOCOLS {
        strip_hop_by_hop(&mut parts.headers);
    }
    Response::from_parts(parts, Body::new(body))
}

/// Synthesized response for a failed upstream exchange.
pub fn for_upstream_error(error: &UpstreamError) -> Response<Body> {
    match error {
        UpstreamError::Timeout(_) => gateway_timeout(),
        _ => bad_gateway(),
    }
}

pub fn bad_gateway() -> Response<Body> {
    (StatusCode::BAD_GATEWAY, BAD_GATEWAY_BODY).into_response()
}

pub fn gateway_timeout() -> Response<Body> {
    (StatusCode::GATEWAY_TIMEOUT, GATEWAY_TIMEOUT_BODY).into_response()
}

pub fn internal_error() -> Response<Body> {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_BODY).into_response()
}
