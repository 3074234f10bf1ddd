//! Upstream target abstraction.
//!
//! # Responsibilities
//! - Represent one backend service (name, scheme, authority)
//! - Build the absolute URI a forwarded request is sent to
//!
//! # Design Decisions
//! - Targets are parsed once at startup and never change
//! - Only plain HTTP is spoken to upstreams; `ws://` is accepted as an alias

use std::fmt;
use std::str::FromStr;

use axum::http::uri::Authority;
use axum::http::Uri;
use url::Url;

use crate::config::UpstreamsConfig;
use crate::upstream::UpstreamError;

/// A single upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    name: String,
    authority: Authority,
}

impl Upstream {
    /// Parse an upstream from a base URL such as `http://127.0.0.1:8001`.
    pub fn parse(name: impl Into<String>, base: &str) -> Result<Self, UpstreamError> {
        let url = Url::parse(base).map_err(|e| UpstreamError::InvalidUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "ws" => {}
            other => return Err(UpstreamError::UnsupportedScheme(other.to_string())),
        }

        let invalid = |reason: &str| UpstreamError::InvalidUrl {
            url: base.to_string(),
            reason: reason.to_string(),
        };
        if !url.username().is_empty() || url.password().is_some() {
            return Err(invalid("credentials are not supported"));
        }
        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("must not carry a path, query or fragment"));
        }
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let authority = Authority::from_str(&format!("{}:{}", host, port))
            .map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            name: name.into(),
            authority,
        })
    }

    /// Name used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `host:port` of the upstream, also used as the rewritten `Host` header.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Absolute URI for a request target (path plus optional query).
    pub fn uri_for(&self, target: &str) -> Result<Uri, axum::http::Error> {
        let uri = format!("http://{}{}", self.authority, target).parse::<Uri>()?;
        Ok(uri)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (http://{})", self.name, self.authority)
    }
}

/// The three services behind the gateway.
#[derive(Debug, Clone)]
pub struct Upstreams {
    pub api: Upstream,
    pub app: Upstream,
    pub site: Upstream,
}

impl Upstreams {
    pub fn from_config(config: &UpstreamsConfig) -> Result<Self, UpstreamError> {
        Ok(Self {
            api: Upstream::parse("api", &config.api)?,
            app: Upstream::parse("app", &config.app)?,
            site: Upstream::parse("site", &config.site)?,
        })
    }
}
