//! Errors surfaced by the gateway service to the connection layer.

use thiserror::Error;

/// Error returned from [`crate::http::GatewayService`].
///
/// Returning an error to hyper closes the connection without writing a
/// response.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Upgrade requested on a path that is not relayed.
    #[error("upgrade rejected for {target}")]
    UpgradeRejected { target: String },
}
