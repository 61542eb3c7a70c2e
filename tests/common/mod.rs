//! Shared test harness: a server on an ephemeral port over the in-memory
//! store, driven by a raw HTTP/1.1 client.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tudu::storage::{AppContext, MemoryTodoStore, TodoStore};
use tudu::{Error, serve_on, todo};

pub struct TestServer {
    pub addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), Error>>,
}

impl TestServer {
    /// Triggers the shutdown channel and waits for the serve loop to
    /// return.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = self.handle.await;
    }
}

/// Spawns the full application against a fresh in-memory store.
pub async fn spawn() -> TestServer {
    spawn_with(Arc::new(MemoryTodoStore::new())).await
}

/// Spawns the full application against the given store.
pub async fn spawn_with(store: Arc<dyn TodoStore>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let ctx = Arc::new(AppContext::new(store));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(serve_on(listener, todo::routes(), ctx, async move {
        let _ = stop_rx.await;
    }));

    TestServer { addr, stop: Some(stop_tx), handle }
}

/// Sends one HTTP/1.1 request and returns `(status, raw body)`.
pub async fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let payload = body.unwrap_or("");
    let raw = format!(
        "{method} {path} HTTP/1.1\r\n\
         host: localhost\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\
         \r\n\
         {payload}",
        payload.len()
    );
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    let response = String::from_utf8(response).unwrap();

    let status: u16 = response[9..12].parse().unwrap();
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_owned())
        .unwrap_or_default();
    (status, body)
}

/// Like [`request`], but parses the body as JSON.
pub async fn request_json(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&str>,
) -> (u16, Value) {
    let (status, body) = request(addr, method, path, body).await;
    let value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, value)
}
