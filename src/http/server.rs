//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Accept connections from the bounded listener
//! - Serve HTTP/1.1 (with upgrades) and HTTP/2 via hyper-util
//! - Wire up middleware (request ID, tracing)
//! - Dispatch requests to the routing engine
//! - Forward requests to upstreams, or relay upgrades
//! - Drain in-flight connections on shutdown

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{Request, Response};
use axum::BoxError;
use futures_util::future::BoxFuture;
use hyper_util::{
    rt::{TokioExecutor, TokioIo, TokioTimer},
    server::conn::auto,
    service::TowerToHyperService,
};
use tower::{Service, ServiceBuilder};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::request::{self, UuidRequestId};
use crate::http::{response, websocket};
use crate::lifecycle::Shutdown;
use crate::net::{ConnectionTracker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::Router;
use crate::upstream::{UpstreamClient, UpstreamError, Upstreams};

/// Read-only state shared by every request.
struct GatewayState {
    router: Router,
    client: UpstreamClient,
    tracker: ConnectionTracker,
    change_origin: bool,
}

/// The gateway as a tower service: route, forward, stream back.
#[derive(Clone)]
pub struct GatewayService {
    state: Arc<GatewayState>,
}

impl GatewayService {
    /// Build the service from configuration.
    pub fn new(config: &GatewayConfig, tracker: ConnectionTracker) -> Result<Self, UpstreamError> {
        let upstreams = Upstreams::from_config(&config.upstreams)?;
        let router = Router::from_config(&config.routing, &upstreams);
        let client = UpstreamClient::new(&config.timeouts);
        Ok(Self::with_router(router, client, tracker, config.proxy.change_origin))
    }

    /// Build the service around an explicit route table.
    pub fn with_router(
        router: Router,
        client: UpstreamClient,
        tracker: ConnectionTracker,
        change_origin: bool,
    ) -> Self {
        Self {
            state: Arc::new(GatewayState {
                router,
                client,
                tracker,
                change_origin,
            }),
        }
    }

    pub fn router(&self) -> &Router {
        &self.state.router
    }
}

impl<B> Service<Request<B>> for GatewayService
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = GatewayError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let state = Arc::clone(&self.state);
        Box::pin(async move { state.handle(req).await })
    }
}

impl GatewayState {
    async fn handle<B>(&self, req: Request<B>) -> Result<Response<Body>, GatewayError>
    where
        B: HttpBody<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let start = Instant::now();
        let method = req.method().clone();
        let target = request::target(&req);
        let request_id = request::request_id(&req).to_string();

        tracing::info!(
            request_id = %request_id,
            method = %method,
            path = %target,
            "Inbound request"
        );

        if websocket::is_upgrade_request(req.headers()) {
            let Some(route) = self.router.route_upgrade(&target) else {
                tracing::info!(
                    request_id = %request_id,
                    path = %target,
                    "Unknown upgrade request, closing connection"
                );
                metrics::record_upgrade("rejected");
                return Err(GatewayError::UpgradeRejected {
                    target: target.clone(),
                });
            };

            tracing::info!(
                request_id = %request_id,
                upstream = %route.upstream,
                path = %route.target,
                "Relaying upgrade"
            );
            let upstream = route.upstream.name().to_string();
            let response =
                websocket::relay(&self.client, &self.tracker, req, route, self.change_origin)
                    .await;
            metrics::record_request(method.as_str(), response.status().as_u16(), &upstream, start);
            return Ok(response);
        }

        let Some(route) = self.router.route(&target) else {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %target,
                "No route matched; route table has no fallback rule"
            );
            metrics::record_request(method.as_str(), 500, "none", start);
            return Ok(response::internal_error());
        };

        tracing::info!(
            request_id = %request_id,
            rule = route.rule,
            upstream = %route.upstream,
            forward_path = %route.target,
            "Proxying request"
        );

        let upstream = route.upstream.name();
        let (parts, body) = req.into_parts();
        let upstream_req = match request::upstream_request(
            parts,
            Body::new(body),
            &route,
            self.change_origin,
            false,
        ) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
                metrics::record_request(method.as_str(), 500, upstream, start);
                return Ok(response::internal_error());
            }
        };

        let response = match self.client.send(upstream_req).await {
            Ok(r) => response::from_upstream(r),
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    upstream = upstream,
                    kind = e.kind(),
                    error = %e,
                    "Upstream request failed"
                );
                metrics::record_upstream_error(upstream, e.kind());
                response::for_upstream_error(&e)
            }
        };

        metrics::record_request(method.as_str(), response.status().as_u16(), upstream, start);
        Ok(response)
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    service: GatewayService,
    tracker: ConnectionTracker,
    shutdown_grace: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, UpstreamError> {
        let tracker = ConnectionTracker::new();
        let service = GatewayService::new(config, tracker.clone())?;
        Ok(Self {
            service,
            tracker,
            shutdown_grace: Duration::from_secs(config.timeouts.shutdown_grace_secs),
        })
    }

    pub fn service(&self) -> &GatewayService {
        &self.service
    }

    /// Run the server until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, shutdown: Shutdown) -> Result<(), ListenerError> {
        let addr = listener.local_addr().map_err(ListenerError::Accept)?;
        tracing::info!(address = %addr, "HTTP server starting");

        let stack = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .service(self.service.clone());

        let mut builder = auto::Builder::new(TokioExecutor::new());
        builder.http1().timer(TokioTimer::new());

        let mut shutdown_rx = shutdown.subscribe();
        loop {
            let (stream, peer_addr, permit) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(ListenerError::Accept(e)) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                    Err(e) => return Err(e),
                },
                _ = shutdown_rx.recv() => break,
            };

            let guard = self.tracker.track();
            let service = TowerToHyperService::new(stack.clone());
            let builder = builder.clone();
            let mut conn_shutdown = shutdown.subscribe();

            tokio::spawn(async move {
                let _permit = permit;
                let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
                tokio::pin!(conn);

                let mut draining = false;
                loop {
                    tokio::select! {
                        res = conn.as_mut() => {
                            if let Err(e) = res {
                                tracing::debug!(
                                    connection_id = %guard.id(),
                                    peer_addr = %peer_addr,
                                    error = %e,
                                    "Connection ended with error"
                                );
                            }
                            break;
                        }
                        _ = conn_shutdown.recv(), if !draining => {
                            draining = true;
                            conn.as_mut().graceful_shutdown();
                        }
                    }
                }
                drop(guard);
            });
        }

        drop(listener);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Stopped accepting connections, draining"
        );

        match tokio::time::timeout(self.shutdown_grace, self.tracker.wait_for_idle()).await {
            Ok(()) => tracing::info!("All connections drained"),
            Err(_) => tracing::warn!(
                remaining = self.tracker.active_count(),
                grace_secs = self.shutdown_grace.as_secs(),
                "Drain deadline reached, abandoning remaining connections"
            ),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimeoutConfig, UpstreamsConfig};
    use crate::routing::matcher::{PathPrefixMatcher, SegmentMatcher};
    use crate::routing::{Rewrite, RouteRule, UpgradePolicy};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn missing_fallback_yields_internal_error() {
        let upstreams = Upstreams::from_config(&UpstreamsConfig::default()).unwrap();
        let router = Router::from_rules(
            vec![RouteRule::new(
                "api",
                PathPrefixMatcher::new("/api/"),
                upstreams.api.clone(),
                Rewrite::None,
            )],
            UpgradePolicy::new(SegmentMatcher::new("/app"), upstreams.app.clone()),
        );
        let mut service = GatewayService::with_router(
            router,
            UpstreamClient::new(&TimeoutConfig::default()),
            ConnectionTracker::new(),
            true,
        );

        let request = Request::builder().uri("/plans").body(Body::empty()).unwrap();
        let response = service.call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_upgrade_is_an_error() {
        let tracker = ConnectionTracker::new();
        let mut service = GatewayService::new(&GatewayConfig::default(), tracker).unwrap();

        let request = Request::builder()
            .uri("/api/chat")
            .header("connection", "Upgrade")
            .header("upgrade", "websocket")
            .body(Body::empty())
            .unwrap();
        let err = service.call(request).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpgradeRejected { target } if target == "/api/chat"));
    }
}
