//! WebSocket upgrade relay and rejection.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;

mod common;

use common::{
    client, gateway_config, start_echo_upstream, start_gateway, start_ws_upstream, unused_addr,
};

const HANDSHAKE_HEADERS: &str = "Connection: Upgrade\r\n\
    Upgrade: websocket\r\n\
    Sec-WebSocket-Version: 13\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n";

async fn raw_upgrade(addr: std::net::SocketAddr, target: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\n{}\r\n",
        target, addr, HANDSHAKE_HEADERS
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    // Read until EOF, reset, or the head of a response.
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
            }
        }
    })
    .await;
    buf
}

async fn assert_echo(url: String) {
    let (mut ws, response) = tokio_tungstenite::connect_async(url).await.unwrap();
    assert_eq!(response.status(), 101);

    ws.send(Message::text("breathe in")).await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(reply.to_text().unwrap(), "breathe in");

    ws.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    let reply = ws.next().await.unwrap().unwrap();
    assert_eq!(reply.into_data().as_ref(), &[1u8, 2, 3]);

    ws.close(None).await.unwrap();
}

#[tokio::test]
async fn test_relays_upgrade_under_app_prefix() {
    let ws = start_ws_upstream().await;
    let site = start_echo_upstream("site").await;
    let gateway = start_gateway(gateway_config(site, ws, site)).await;

    assert_echo(format!("ws://{}/app/ws", gateway.addr)).await;

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_relays_upgrade_with_dev_server_marker() {
    let ws = start_ws_upstream().await;
    let site = start_echo_upstream("site").await;
    let gateway = start_gateway(gateway_config(site, ws, site)).await;

    assert_echo(format!("ws://{}/_expo/ws", gateway.addr)).await;

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_rejects_upgrade_outside_app_without_response() {
    let ws = start_ws_upstream().await;
    let site = start_echo_upstream("site").await;
    let gateway = start_gateway(gateway_config(site, ws, site)).await;

    for target in ["/chat", "/api/chat", "/"] {
        let received = raw_upgrade(gateway.addr, target).await;
        assert!(
            received.is_empty(),
            "target {} got {:?}",
            target,
            String::from_utf8_lossy(&received)
        );
    }

    // Still serving.
    let res = client().get(gateway.url("/plans")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_upgrade_to_down_upstream_yields_502() {
    let app = unused_addr().await;
    let site = start_echo_upstream("site").await;
    let gateway = start_gateway(gateway_config(site, app, site)).await;

    let received = raw_upgrade(gateway.addr, "/app/ws").await;
    let head = String::from_utf8_lossy(&received);
    assert!(head.starts_with("HTTP/1.1 502"), "got {:?}", head);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_upgrade_declined_by_upstream_passes_through() {
    // A plain HTTP server answers the handshake with 200.
    let app = start_echo_upstream("app").await;
    let site = start_echo_upstream("site").await;
    let gateway = start_gateway(gateway_config(site, app, site)).await;

    let received = raw_upgrade(gateway.addr, "/app/ws").await;
    let head = String::from_utf8_lossy(&received);
    assert!(head.starts_with("HTTP/1.1 200"), "got {:?}", head);

    gateway.shutdown.trigger();
}
