//! Unified gateway library.
//!
//! One listening port in front of the API backend, the app runtime and the
//! marketing site. Requests are routed by path prefix and proxied as streams;
//! app WebSocket upgrades are relayed byte for byte.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
