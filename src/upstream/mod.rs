//! Upstream services and the client that reaches them.
//!
//! # Data Flow
//! ```text
//! UpstreamsConfig (URLs)
//!     → target.rs (parse into Upstream {name, authority})
//!     → referenced by route rules
//!
//! Forwarded request
//!     → client.rs (pooled hyper client, connect + response timeouts)
//!     → Response<Incoming> streamed back to the caller
//! ```

use std::time::Duration;

use thiserror::Error;

pub mod client;
pub mod target;

pub use client::UpstreamClient;
pub use target::{Upstream, Upstreams};

/// Errors from parsing or reaching an upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported upstream scheme '{0}' (expected http or ws)")]
    UnsupportedScheme(String),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::InvalidUrl { .. } | UpstreamError::UnsupportedScheme(_) => "config",
            UpstreamError::Request(e) if e.is_connect() => "connect",
            UpstreamError::Request(_) => "transport",
            UpstreamError::Timeout(_) => "timeout",
        }
    }
}
