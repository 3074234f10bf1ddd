//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Addresses of the three upstream services.
    pub upstreams: UpstreamsConfig,

    /// Prefixes driving the route table.
    pub routing: RoutingConfig,

    /// Forwarding behaviour.
    pub proxy: ProxyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Upstream base URLs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// JSON API backend.
    pub api: String,

    /// App runtime / dev server (HTTP and WebSocket).
    pub app: String,

    /// Marketing site, receives everything else.
    pub site: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            api: "http://127.0.0.1:8001".to_string(),
            app: "http://127.0.0.1:3000".to_string(),
            site: "http://127.0.0.1:9000".to_string(),
        }
    }
}

/// Route table inputs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Targets starting with this prefix go to the API, unmodified.
    pub api_prefix: String,

    /// Mount point of the app; stripped before forwarding.
    pub app_prefix: String,

    /// Static asset prefixes served by the app upstream.
    pub asset_prefixes: Vec<String>,

    /// Substrings that mark an upgrade request as belonging to the app
    /// dev server even outside the app prefix.
    pub upgrade_markers: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/".to_string(),
            app_prefix: "/app".to_string(),
            asset_prefixes: ["/_expo", "/assets", "/static", "/node_modules", "/fonts"]
                .into_iter()
                .map(String::from)
                .collect(),
            upgrade_markers: vec!["_expo".to_string()],
        }
    }
}

/// Forwarding behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Rewrite the `Host` header to the upstream authority.
    pub change_origin: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { change_origin: true }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to return response headers, in seconds.
    pub response_secs: u64,

    /// Idle pooled upstream connection timeout in seconds.
    pub idle_secs: u64,

    /// How long shutdown waits for in-flight connections to drain.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 30,
            idle_secs: 90,
            shutdown_grace_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
