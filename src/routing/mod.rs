//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request target (path + query)
//!     → router.rs (ordered rule scan)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: RouteMatch {rule, upstream, rewritten target}
//!
//! Route Compilation (at startup):
//!     RoutingConfig + Upstreams
//!     → api, app, assets, site (fixed precedence)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins; the last rule is a catch-all

pub mod matcher;
pub mod router;

pub use router::{Rewrite, RouteMatch, RouteRule, Router, UpgradePolicy};
