//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper-util auto builder, tower middleware)
//!     → request.rs (request ID, target extraction)
//!     → [routing layer picks the upstream]
//!     → websocket.rs (upgrade relay) | upstream client
//!     → response.rs (pass-through or synthesized error)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{GatewayService, HttpServer};
