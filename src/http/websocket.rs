//! WebSocket proxy handling.
//!
//! # Responsibilities
//! - Forward the upgrade handshake to the app upstream
//! - Hand the 101 back to the client
//! - Relay raw bytes between both upgraded connections
//!
//! # Data Flow
//! ```text
//! Client ←──── upgrade handshake ────→ Gateway ←──── upgrade handshake ────→ Upstream
//! Client ←════ bytes (copy_bidirectional) ════════════════════════════════→ Upstream
//! ```
//!
//! # Design Decisions
//! - Byte-level relay, no frame parsing: close/ping/pong pass through untouched
//! - A non-101 answer from the upstream is returned as a normal response
//! - The relay task holds a connection guard so shutdown drains it

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::copy_bidirectional;

use crate::http::{request, response};
use crate::net::ConnectionTracker;
use crate::observability::metrics;
use crate::routing::RouteMatch;
use crate::upstream::UpstreamClient;

pub use crate::http::headers::is_upgrade_request;

/// Forward an accepted upgrade request and, on 101, start relaying.
pub async fn relay<B>(
    client: &UpstreamClient,
    tracker: &ConnectionTracker,
    mut req: Request<B>,
    route: RouteMatch<'_>,
    change_origin: bool,
) -> Response<Body> {
    let start = Instant::now();
    let request_id = request::request_id(&req).to_string();
    let upstream_name = route.upstream.name().to_string();
    let on_client_upgrade = hyper::upgrade::on(&mut req);

    // The handshake body is empty; whatever the client sends after the head
    // belongs to the upgraded stream.
    let (parts, body) = req.into_parts();
    drop(body);
    let upstream_req =
        match request::upstream_request(parts, Body::empty(), &route, change_origin, true) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to build upgrade request");
                metrics::record_upgrade("failed");
                return response::internal_error();
            }
        };

    let mut upstream_resp = match client.send(upstream_req).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                upstream = %upstream_name,
                error = %e,
                "Upgrade handshake with upstream failed"
            );
            metrics::record_upstream_error(&upstream_name, e.kind());
            metrics::record_upgrade("failed");
            return response::for_upstream_error(&e);
        }
    };

    if upstream_resp.status() != StatusCode::SWITCHING_PROTOCOLS {
        tracing::info!(
            request_id = %request_id,
            upstream = %upstream_name,
            status = %upstream_resp.status(),
            "Upstream declined upgrade"
        );
        metrics::record_upgrade("refused");
        return response::from_upstream(upstream_resp);
    }

    let on_upstream_upgrade = hyper::upgrade::on(&mut upstream_resp);
    let guard = tracker.track();
    let target = route.target.into_owned();

    tokio::spawn(async move {
        let (client_io, upstream_io) = match tokio::try_join!(on_client_upgrade, on_upstream_upgrade) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Upgrade did not complete");
                return;
            }
        };

        tracing::info!(
            request_id = %request_id,
            connection_id = %guard.id(),
            upstream = %upstream_name,
            path = %target,
            "WebSocket relay established"
        );

        let mut client_io = TokioIo::new(client_io);
        let mut upstream_io = TokioIo::new(upstream_io);
        match copy_bidirectional(&mut client_io, &mut upstream_io).await {
            Ok((from_client, from_upstream)) => tracing::info!(
                request_id = %request_id,
                connection_id = %guard.id(),
                from_client,
                from_upstream,
                duration_ms = start.elapsed().as_millis() as u64,
                "WebSocket relay closed"
            ),
            Err(e) => tracing::debug!(
                request_id = %request_id,
                connection_id = %guard.id(),
                error = %e,
                "WebSocket relay ended with error"
            ),
        }
        drop(guard);
    });

    metrics::record_upgrade("relayed");
    response::from_upstream(upstream_resp)
}
