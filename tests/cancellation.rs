//! Dropping an in-flight gateway call must drop the upstream call with it.

mod common;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, Method, header};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

use common::{PREFIX, serve};
use prometheus_gateway::entitlement::StaticEntitlementChecker;
use prometheus_gateway::gateway::{self, Gateway, InboundRequest};
use prometheus_gateway::identity::StaticIdentityVerifier;
use prometheus_gateway::{
    AccessPolicy, OperationRegistry, ProxyRequest, ProxyResponse, Upstream, UpstreamError,
};

/// Fires its sender when dropped.
struct DropSignal(Option<oneshot::Sender<()>>);

impl Drop for DropSignal {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// Upstream that never answers. Reports when a call starts and when it is dropped.
struct HangingUpstream {
    started: Mutex<Option<oneshot::Sender<()>>>,
    dropped: Mutex<Option<oneshot::Sender<()>>>,
}

#[async_trait]
impl Upstream for HangingUpstream {
    async fn send(&self, _request: ProxyRequest) -> Result<ProxyResponse, UpstreamError> {
        let _guard = DropSignal(self.dropped.lock().unwrap().take());
        if let Some(tx) = self.started.lock().unwrap().take() {
            let _ = tx.send(());
        }
        std::future::pending().await
    }
}

/// Gateway in front of a hanging upstream, plus its (started, dropped) signals.
fn hanging_gateway() -> (Gateway, oneshot::Receiver<()>, oneshot::Receiver<()>) {
    let (started_tx, started_rx) = oneshot::channel();
    let (dropped_tx, dropped_rx) = oneshot::channel();
    let upstream = HangingUpstream {
        started: Mutex::new(Some(started_tx)),
        dropped: Mutex::new(Some(dropped_tx)),
    };

    let gateway = Gateway::new(
        Arc::new(OperationRegistry::trading_defaults()),
        Arc::new(AccessPolicy::default_table()),
        Arc::new(StaticIdentityVerifier::new([("t", "user")])),
        Arc::new(StaticEntitlementChecker::new(["user"])),
        Arc::new(upstream),
    );
    (gateway, started_rx, dropped_rx)
}

async fn wait(rx: oneshot::Receiver<()>, what: &str) {
    tokio::time::timeout(Duration::from_secs(2), rx)
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
        .unwrap();
}

#[tokio::test]
async fn aborting_handle_cancels_upstream_call() {
    let (gateway, started_rx, dropped_rx) = hanging_gateway();

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
    let request = InboundRequest {
        method: Method::POST,
        path: "generate-signals".to_string(),
        headers,
        body: Bytes::from_static(b"{}"),
    };

    let task = tokio::spawn(async move { gateway.handle(request).await });

    wait(started_rx, "upstream call to start").await;
    task.abort();
    wait(dropped_rx, "upstream call to be dropped").await;
    assert!(task.await.unwrap_err().is_cancelled());
}

#[tokio::test]
async fn closing_the_connection_cancels_upstream_call() {
    let (gateway, started_rx, dropped_rx) = hanging_gateway();
    let addr = serve(gateway::router(gateway, PREFIX)).await;

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "POST {}/generate-signals HTTP/1.1\r\nHost: {}\r\nAuthorization: Bearer t\r\nContent-Type: application/json\r\nContent-Length: 2\r\n\r\n{{}}",
        PREFIX, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    wait(started_rx, "upstream call to start").await;
    drop(stream);
    wait(dropped_rx, "upstream call to be dropped").await;
}
