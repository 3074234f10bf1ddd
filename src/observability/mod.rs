//! Logs and metrics.
//!
//! # Data Flow
//! ```text
//! http, net, lifecycle
//!     → logging.rs (tracing events, pretty or JSON on stdout)
//!     → metrics.rs (metrics facade → Prometheus exporter when enabled)
//! ```
//!
//! # Design Decisions
//! - `x-request-id` is attached to every per-request event
//! - With the exporter off, metric calls hit the no-op recorder

pub mod logging;
pub mod metrics;
