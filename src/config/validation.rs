//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that upstream URLs are usable by the HTTP client
//! - Check that route prefixes are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;
use crate::upstream::Upstream;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::new("listener.max_connections", "must be greater than 0"));
    }

    let upstreams = [
        ("upstreams.api", "api", &config.upstreams.api),
        ("upstreams.app", "app", &config.upstreams.app),
        ("upstreams.site", "site", &config.upstreams.site),
    ];
    for (field, name, url) in upstreams {
        if let Err(e) = Upstream::parse(name, url) {
            errors.push(ValidationError::new(field, e.to_string()));
        }
    }

    let routing = &config.routing;
    check_prefix(&mut errors, "routing.api_prefix", &routing.api_prefix);
    check_prefix(&mut errors, "routing.app_prefix", &routing.app_prefix);
    if routing.app_prefix == "/" || routing.app_prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "routing.app_prefix",
            "must name a path segment without a trailing '/'",
        ));
    }
    if routing.asset_prefixes.is_empty() {
        errors.push(ValidationError::new("routing.asset_prefixes", "must not be empty"));
    }
    for (i, prefix) in routing.asset_prefixes.iter().enumerate() {
        check_prefix(&mut errors, &format!("routing.asset_prefixes[{}]", i), prefix);
    }
    if routing.upgrade_markers.iter().any(String::is_empty) {
        errors.push(ValidationError::new("routing.upgrade_markers", "markers must not be empty"));
    }

    let timeouts = [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.response_secs", config.timeouts.response_secs),
        ("timeouts.idle_secs", config.timeouts.idle_secs),
        ("timeouts.shutdown_grace_secs", config.timeouts.shutdown_grace_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    let observability = &config.observability;
    if !matches!(
        observability.log_level.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_prefix(errors: &mut Vec<ValidationError>, field: &str, prefix: &str) {
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new(field, format!("'{}' must start with '/'", prefix)));
    }
}
