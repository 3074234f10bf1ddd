//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional config file (TOML) via loader.rs
//!     → environment overrides (PORT, GATEWAY_*_UPSTREAM)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, RoutingConfig,
    TimeoutConfig, UpstreamsConfig,
};
