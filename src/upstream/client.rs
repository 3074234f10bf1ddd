//! Shared HTTP client used to reach every upstream.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::upstream::UpstreamError;

/// One long-lived client for all upstreams; hyper pools connections per
/// authority.
#[derive(Clone)]
pub struct UpstreamClient {
    inner: Client<HttpConnector, Body>,
    response_timeout: Duration,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(connector);

        Self {
            inner,
            response_timeout: Duration::from_secs(timeouts.response_secs),
        }
    }

    /// Send a request and wait for the response head.
    ///
    /// The body is not awaited here; it streams to the caller afterwards.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, UpstreamError> {
        match tokio::time::timeout(self.response_timeout, self.inner.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(UpstreamError::Request(e)),
            Err(_) => Err(UpstreamError::Timeout(self.response_timeout)),
        }
    }
}
