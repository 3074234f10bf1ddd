//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Log the route table
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::Router;
use crate::upstream::UpstreamError;

/// Fatal errors before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid upstream: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),
}

/// Run the gateway until a termination signal has been handled.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    let observability = &config.observability;
    if observability.metrics_enabled {
        let addr: SocketAddr = observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let server = HttpServer::new(&config)?;
    log_routes(server.service().router());

    let listener = Listener::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    server.run(listener, shutdown).await?;
    Ok(())
}

/// Startup banner: one line per rule, in evaluation order.
pub fn log_routes(router: &Router) {
    for (position, rule) in router.rules().iter().enumerate() {
        tracing::info!(
            position,
            rule = %rule.name,
            matcher = ?rule.matcher,
            rewrite = ?rule.rewrite,
            upstream = %rule.upstream,
            "Route"
        );
    }
    if !router.is_total() {
        tracing::warn!("Route table has no catch-all rule; unmatched requests will get 500");
    }
}
