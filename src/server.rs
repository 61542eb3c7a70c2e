//! HTTP server and graceful shutdown.
//!
//! Two tasks rendezvous at shutdown and nowhere else:
//!
//! - the **accept loop**, spawned onto its own task, which accepts
//!   connections and spawns one task per connection into a `JoinSet`;
//! - the **controlling task**, which blocks in [`Server::serve`] waiting
//!   for the first interrupt.
//!
//! On interrupt the controller sends one message over a oneshot channel —
//! explicit message passing, so there is no racy "should I stop accepting"
//! flag — and the accept loop stops taking connections and drains its
//! in-flight set. The controller waits at most [`DRAIN_TIMEOUT`] for the
//! drain; requests still running when the bound expires are abandoned and
//! the process exits. Further interrupts during the drain are not consumed
//! and do not shorten it.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::storage::AppContext;

/// How long in-flight requests get to finish after the shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a graceful shutdown: SIGTERM or Ctrl-C, followed
    /// by the bounded drain of in-flight requests.
    pub async fn serve(self, router: Router, ctx: Arc<AppContext>) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        serve_on(listener, router, ctx, shutdown_signal()).await
    }
}

/// The core serve loop with an injected shutdown future.
///
/// [`Server::serve`] wires this to the OS signal handler; tests wire it to
/// a channel and an ephemeral-port listener.
pub async fn serve_on(
    listener: TcpListener,
    router: Router,
    ctx: Arc<AppContext>,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<(), Error> {
    let addr = listener.local_addr()?;
    info!(addr = %addr, "tudu listening");

    let router = Arc::new(router);
    let (stop_tx, stop_rx) = oneshot::channel();
    let worker = tokio::spawn(accept_loop(listener, router, ctx, stop_rx));

    // The controlling task blocks here for the lifetime of the process.
    shutdown.await;
    info!("shutdown signal received, draining in-flight requests");

    // The accept loop may already be gone if the listener failed; a dead
    // receiver is fine either way.
    let _ = stop_tx.send(());

    if tokio::time::timeout(DRAIN_TIMEOUT, worker).await.is_err() {
        warn!("drain deadline exceeded, abandoning remaining requests");
    }

    info!("tudu stopped");
    Ok(())
}

/// Accepts connections until told to stop, then drains its tasks.
async fn accept_loop(
    listener: TcpListener,
    router: Arc<Router>,
    ctx: Arc<AppContext>,
    mut stop: oneshot::Receiver<()>,
) {
    // JoinSet tracks every spawned connection task so we can wait for them
    // all to finish during the drain.
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            // `biased` checks arms top-to-bottom: a shutdown message stops
            // accepting immediately even if more connections are queued.
            biased;

            _ = &mut stop => {
                info!(in_flight = tasks.len(), "accept loop stopping");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let router = Arc::clone(&router);
                let ctx = Arc::clone(&ctx);
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // `service_fn` is called once per request on the
                    // connection, not once per connection.
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        let ctx = Arc::clone(&ctx);
                        async move { dispatch(router, ctx, req).await }
                    });

                    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    while tasks.join_next().await.is_some() {}
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: routes one request, runs its handler, logs the outcome.
///
/// The error type is `Infallible` — every failure becomes an HTTP response
/// here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    ctx: Arc<AppContext>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method;
    let path = parts.uri.path().to_owned();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!(method = %method, path = %path, "failed to read request body: {e}");
            return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_http());
        }
    };

    let response = match router.lookup(&method, &path) {
        Some((handler, params)) => {
            let request = Request::new(method.clone(), path.clone(), parts.headers, body, params);
            handler.call(request, ctx).await
        }
        None => Response::status(http::StatusCode::NOT_FOUND),
    };

    info!(
        method = %method,
        path = %path,
        status = response.status_code().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );

    Ok(response.into_http())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C). On
/// Windows only Ctrl-C is available. Because the handler stays installed,
/// a second interrupt during the drain is swallowed rather than killing
/// the process early.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
