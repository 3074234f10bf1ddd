//! Socket layer.
//!
//! # Data Flow
//! ```text
//! public port
//!     → listener.rs (permit per connection, capped at max_connections)
//!     → connection.rs (guard per socket and per upgraded relay)
//!     → http::server (hyper connection task)
//! ```
//!
//! # Design Decisions
//! - The permit is released when hyper hands an upgraded socket off
//! - The guard outlives the permit so drain still waits for relays

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{ConnectionPermit, Listener, ListenerError};
