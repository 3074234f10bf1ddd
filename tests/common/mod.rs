//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use unified_gateway::config::GatewayConfig;
use unified_gateway::net::{Listener, ListenerError};
use unified_gateway::{HttpServer, Shutdown};

/// Start an HTTP upstream that describes every request it receives.
///
/// Body: `"{name} {method} {target} host={host}\n{request body}"`.
/// `/created` answers 201 with an `x-custom` header, `/slow` waits 2s.
pub async fn start_echo_upstream(name: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo).with_state(name);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn echo(State(name): State<&'static str>, req: Request) -> Response {
    match req.uri().path() {
        "/created" => {
            return (StatusCode::CREATED, [("x-custom", "yes")], "created").into_response();
        }
        "/slow" => tokio::time::sleep(Duration::from_secs(2)).await,
        _ => {}
    }

    let method = req.method().clone();
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap_or_default();

    (
        [("x-upstream", name)],
        format!(
            "{} {} {} host={}\n{}",
            name,
            method,
            target,
            host,
            String::from_utf8_lossy(&body)
        ),
    )
        .into_response()
}

/// Flags set by [`start_hanging_upstream`].
#[derive(Clone, Default)]
pub struct HangFlags {
    pub started: Arc<AtomicBool>,
    pub dropped: Arc<AtomicBool>,
}

struct SetOnDrop(Arc<AtomicBool>);

impl Drop for SetOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Start an upstream whose handler sleeps 10s on every request.
///
/// `started` is set when a handler begins, `dropped` when its future is
/// dropped before finishing.
pub async fn start_hanging_upstream() -> (SocketAddr, HangFlags) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let flags = HangFlags::default();

    let state = flags.clone();
    let app = Router::new().fallback(move || {
        let flags = state.clone();
        async move {
            flags.started.store(true, Ordering::SeqCst);
            let guard = SetOnDrop(flags.dropped.clone());
            tokio::time::sleep(Duration::from_secs(10)).await;
            std::mem::forget(guard);
            "late"
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, flags)
}

/// Start a raw upstream that promises `Content-Length: 100`, sends 5 bytes
/// and closes.
pub async fn start_truncating_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nhello")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    addr
}

/// Poll `flag` until it is set or `within` elapses.
pub async fn wait_for_flag(flag: &AtomicBool, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if flag.load(Ordering::SeqCst) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    flag.load(Ordering::SeqCst)
}

/// Start a WebSocket upstream that echoes text and binary messages.
pub async fn start_ws_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    if (msg.is_text() || msg.is_binary()) && ws.send(msg).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config on an ephemeral loopback port.
pub fn gateway_config(api: SocketAddr, app: SocketAddr, site: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstreams.api = format!("http://{}", api);
    config.upstreams.app = format!("http://{}", app);
    config.upstreams.site = format!("http://{}", site);
    config.timeouts.shutdown_grace_secs = 2;
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ListenerError>>,
}

impl RunningGateway {
    pub fn url(&self, target: &str) -> String {
        format!("http://{}{}", self.addr, target)
    }
}

/// Bind and run a gateway in the background.
pub async fn start_gateway(config: GatewayConfig) -> RunningGateway {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(&config).unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));
    RunningGateway {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
