//! HTTP server and graceful shutdown.
//!
//! One tokio task per connection; hyper drives HTTP/1.1 or HTTP/2, whichever
//! the client speaks. On SIGTERM or Ctrl-C the server:
//! 1. stops accepting new connections,
//! 2. lets every in-flight connection task run to completion,
//! 3. returns from [`Server::serve`].
//!
//! Request bodies are buffered whole before routing, up to
//! [`DEFAULT_MAX_BODY_BYTES`] unless [`Server::max_body_bytes`] says otherwise.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::error::Error;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// Largest request body accepted by default (1 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
    max_body_bytes: usize,
}

impl Server {
    /// Binds `addr` (`host:port`). Port `0` picks a free port; see
    /// [`local_addr`](Server::local_addr).
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), userbase::Error> {
    /// let server = userbase::Server::bind("0.0.0.0:3000").await?;
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: &str) -> Result<Self, Error> {
        let addr: SocketAddr = addr.parse().map_err(|_| Error::InvalidAddr(addr.to_owned()))?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, max_body_bytes: DEFAULT_MAX_BODY_BYTES })
    }

    /// Caps request bodies at `limit` bytes; larger ones get `413` and never
    /// reach a handler.
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves, then drains in-flight
    /// connections before returning.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let router = Arc::new(router);
        let Self { listener, max_body_bytes } = self;
        let addr = listener.local_addr()?;

        info!(%addr, max_body_bytes, "userbase listening");

        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so a queued backlog cannot delay it.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
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

                    let conn = Connection {
                        router: Arc::clone(&router),
                        peer: remote_addr,
                        max_body_bytes,
                    };
                    tasks.spawn(conn.run(TokioIo::new(stream)));
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("userbase stopped");
        Ok(())
    }
}

// ── Connections ───────────────────────────────────────────────────────────────

/// Everything one accepted connection needs; cloned into each request.
#[derive(Clone)]
struct Connection {
    router: Arc<Router>,
    peer: SocketAddr,
    max_body_bytes: usize,
}

impl Connection {
    async fn run(self, io: TokioIo<TcpStream>) {
        let peer = self.peer;
        let svc = service_fn(move |req| self.clone().dispatch(req));
        if let Err(e) = ConnBuilder::new(TokioExecutor::new()).serve_connection(io, svc).await {
            error!(%peer, "connection error: {e}");
        }
    }

    /// Collects the body, routes the request, and logs the outcome.
    ///
    /// Infallible: every failure is already a [`Response`] by the time hyper
    /// sees it.
    async fn dispatch(
        self,
        req: hyper::Request<Incoming>,
    ) -> Result<http::Response<Full<Bytes>>, Infallible> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let path = parts.uri.path();

        let response = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => self.router.dispatch(&parts.method, path, collected.to_bytes()).await,
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(peer = %self.peer, limit = self.max_body_bytes, "request body too large");
                Response::error(Status::PayloadTooLarge, "request body too large")
            }
            Err(e) => {
                warn!(peer = %self.peer, "failed to read request body: {e}");
                Response::error(Status::BadRequest, "failed to read request body")
            }
        };

        info!(
            method = %parts.method,
            path = %path,
            status = u16::from(response.status_code()),
            latency_us = started.elapsed().as_micros() as u64,
            peer = %self.peer,
            "request"
        );

        Ok(response.into_inner())
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C). On non-Unix platforms
/// only Ctrl-C is available. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
