//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! startup.rs:  metrics exporter → server + route banner → bind → serve
//! signals.rs:  SIGINT / SIGTERM → Shutdown::trigger (second signal exits)
//! shutdown.rs: sticky flag → accept loop stops → connections drain
//! ```
//!
//! # Design Decisions
//! - A bind failure is fatal and reported before any traffic
//! - Draining is bounded by `timeouts.shutdown_grace_secs`

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
