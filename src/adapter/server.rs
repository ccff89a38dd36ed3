//! hyper-backed [`Server`] with graceful shutdown.
//!
//! # Shutdown
//!
//! [`Server::stop`] (or cancelling the token passed to `start`):
//! 1. Immediately stops `listener.accept()`; no new connections are made.
//! 2. Asks every open connection to finish its current request and close.
//! 3. Waits for the connection tasks until the caller's deadline.
//!
//! Only once the deadline has passed are request scopes cancelled and the
//! remaining connection tasks aborted. For Kubernetes, pick a deadline shorter
//! than `terminationGracePeriodSeconds` (default 30 s).

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{ALLOW, HeaderValue};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, oneshot};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context::RequestContext;
use super::response::Outcome;
use super::routes::{Lookup, RouteTable};
use crate::config::Config;
use crate::error::{Error, ShutdownError, StartError};
use crate::method::Method;
use crate::server::{Server, ServerState};
use crate::status::Status;

type HttpResponse = http::Response<Full<Bytes>>;

/// The reference [`Server`] implementation.
///
/// ```rust,no_run
/// use std::time::Duration;
/// use switchyard::{CancellationToken, Config, Handler, Server, health::Health};
/// use switchyard::adapter::{HyperServer, RouteTable, shutdown_signal};
///
/// # async fn run() -> Result<(), switchyard::Error> {
/// let mut routes = RouteTable::new();
/// Health.register_routes(&mut routes);
///
/// let server = HyperServer::new(Config::new("0.0.0.0", 3000), routes);
/// server.start(CancellationToken::new()).await?;
/// shutdown_signal().await;
/// server.stop(tokio::time::Instant::now() + Duration::from_secs(25)).await
/// # }
/// ```
pub struct HyperServer {
    config: Config,
    shared: Arc<Shared>,
    local_addr: OnceLock<SocketAddr>,
    lifecycle: Mutex<Lifecycle>,
}

/// State every connection task reads.
struct Shared {
    routes: RouteTable,
    /// Parent of every request scope; cancelled when a stop deadline passes.
    requests: CancellationToken,
    in_flight: AtomicUsize,
}

struct Lifecycle {
    state: ServerState,
    shutdown: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

impl HyperServer {
    pub fn new(config: Config, routes: RouteTable) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                routes,
                requests: CancellationToken::new(),
                in_flight: AtomicUsize::new(0),
            }),
            local_addr: OnceLock::new(),
            lifecycle: Mutex::new(Lifecycle { state: ServerState::Unstarted, shutdown: None, task: None }),
        }
    }

    /// Number of requests currently being handled.
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> ServerState {
        self.lifecycle.lock().await.state
    }
}

#[async_trait]
impl Server for HyperServer {
    async fn start(&self, cancel: CancellationToken) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state != ServerState::Unstarted {
            return Err(StartError::InvalidState(lifecycle.state).into());
        }

        let listener = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(StartError::Cancelled.into()),
            res = TcpListener::bind((self.config.bind_host(), self.config.port)) => {
                res.map_err(|source| StartError::Bind { addr: self.config.addr(), source })?
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|source| StartError::Bind { addr: self.config.addr(), source })?;
        let _ = self.local_addr.set(local_addr);

        let shutdown = cancel.child_token();
        let task = tokio::spawn(serve(listener, Arc::clone(&self.shared), shutdown.clone()));

        lifecycle.state = ServerState::Running;
        lifecycle.shutdown = Some(shutdown);
        lifecycle.task = Some(task);
        info!(addr = %local_addr, "switchyard listening");
        Ok(())
    }

    async fn stop(&self, deadline: Instant) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.state != ServerState::Running {
            return Err(ShutdownError::InvalidState(lifecycle.state).into());
        }
        lifecycle.state = ServerState::Stopped;
        if let Some(shutdown) = lifecycle.shutdown.take() {
            shutdown.cancel();
        }
        let Some(mut task) = lifecycle.task.take() else {
            return Ok(());
        };

        if Instant::now() >= deadline {
            return Err(self.force_close(task));
        }

        match tokio::time::timeout_at(deadline, &mut task).await {
            Ok(Ok(())) => {
                info!("switchyard stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ShutdownError::Abnormal(e.to_string()).into()),
            Err(_) => Err(self.force_close(task)),
        }
    }

    fn addr(&self) -> String {
        self.local_addr
            .get()
            .map_or_else(|| self.config.addr(), ToString::to_string)
    }
}

impl HyperServer {
    /// Deadline passed: cancel request scopes and drop every connection.
    fn force_close(&self, task: JoinHandle<()>) -> Error {
        let in_flight = self.in_flight();
        warn!(in_flight, "shutdown deadline elapsed, closing remaining connections");
        self.shared.requests.cancel();
        task.abort();
        ShutdownError::Timeout { in_flight }.into()
    }
}

impl Drop for HyperServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.lifecycle.get_mut().shutdown.take() {
            shutdown.cancel();
        }
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

async fn serve(listener: TcpListener, shared: Arc<Shared>, shutdown: CancellationToken) {
    // Every connection task lives in the JoinSet; dropping it (on abort)
    // tears all of them down.
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            // Check shutdown first so a stop immediately halts accepting,
            // even with connections queued.
            biased;

            () = shutdown.cancelled() => {
                info!(connections = tasks.len(), "shutdown requested, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        if let Some(delay) = accept_backoff(&e) {
                            error!("accept error, retrying in {delay:?}: {e}");
                            tokio::time::sleep(delay).await;
                        } else {
                            debug!("connection dropped before accept: {e}");
                        }
                        continue;
                    }
                };
                tasks.spawn(serve_connection(stream, peer, Arc::clone(&shared), shutdown.clone()));
            }

            // Reap finished connection tasks so the JoinSet stays bounded.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    drop(listener);
    while tasks.join_next().await.is_some() {}
}

/// Pause after an accept failure that is not about a single peer.
///
/// Resource exhaustion (`EMFILE`, `ENFILE`, `ENOBUFS`) makes `accept` fail
/// immediately on every call until something frees up.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

fn accept_backoff(err: &io::Error) -> Option<Duration> {
    match err.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset => None,
        _ => Some(ACCEPT_ERROR_BACKOFF),
    }
}

async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    shared: Arc<Shared>,
    shutdown: CancellationToken,
) {
    let io = TokioIo::new(stream);
    // Called once per request on the connection, not once per connection.
    let svc = service_fn(move |req| {
        let shared = Arc::clone(&shared);
        async move { Ok::<_, Infallible>(dispatch(&shared, req).await) }
    });

    // HTTP/1.1 or HTTP/2, whatever the client negotiates.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(io, svc);
    tokio::pin!(conn);

    let result = tokio::select! {
        res = conn.as_mut() => res,
        () = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };
    if let Err(e) = result {
        debug!(%peer, "connection error: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure is answered
/// here, so hyper never sees an error.
async fn dispatch(shared: &Shared, req: hyper::Request<Incoming>) -> HttpResponse {
    let _in_flight = InFlight::enter(&shared.in_flight);
    let (parts, body) = req.into_parts();

    let Ok(method) = Method::try_from(&parts.method) else {
        // Not a method any route can carry, so every registered one is allowed.
        let allowed = shared.routes.allowed(parts.uri.path());
        if allowed.is_empty() {
            return plain(Status::NotFound, Status::NotFound.reason());
        }
        return method_not_allowed(&allowed);
    };
    let (handler, params) = match shared.routes.lookup(method, parts.uri.path()) {
        Lookup::Found(handler, params) => (handler, params),
        Lookup::MethodNotAllowed(allowed) => return method_not_allowed(&allowed),
        Lookup::MalformedParam(name) => {
            debug!(%method, path = parts.uri.path(), param = %name, "path parameter is not valid UTF-8");
            return plain(Status::BadRequest, &format!("path parameter `{name}` is not valid UTF-8"));
        }
        Lookup::NotFound => return plain(Status::NotFound, Status::NotFound.reason()),
    };

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            debug!(%method, path = parts.uri.path(), "failed to read request body: {e}");
            return plain(Status::BadRequest, "unreadable request body");
        }
    };

    let scope = shared.requests.child_token();
    // Cancels the request scope once the response is produced, or when
    // hyper drops this future because the client went away.
    let _scope = scope.clone().drop_guard();

    let (tx, mut rx) = oneshot::channel();
    let path = parts.uri.path().to_owned();
    let ctx = RequestContext::new(http::Request::from_parts(parts, body), params, scope, tx);
    let result = handler.call(Box::new(ctx)).await;

    match (result, rx.try_recv()) {
        (Ok(()), Ok(outcome)) => outcome.response,
        (Err(e), Ok(Outcome { response, committed: true })) => {
            warn!(%method, path = %path, "handler failed after committing its response: {e}");
            response
        }
        (Err(e), _) => error_response(method, &path, &e),
        (Ok(()), Err(_)) => {
            error!(%method, path = %path, "handler kept its context past the end of the request");
            plain(Status::InternalServerError, Status::InternalServerError.reason())
        }
    }
}

/// Error translation policy of this adapter.
fn error_response(method: Method, path: &str, err: &Error) -> HttpResponse {
    let status = match err {
        Error::Bind(_) => Status::BadRequest,
        Error::Handler(h) => h.status().unwrap_or(Status::InternalServerError),
        _ => Status::InternalServerError,
    };
    if status.is_server_error() {
        error!(%method, path, %status, "handler error: {err}");
        plain(status, status.reason())
    } else {
        debug!(%method, path, %status, "handler rejected request: {err}");
        plain(status, &err.to_string())
    }
}

fn method_not_allowed(allowed: &[Method]) -> HttpResponse {
    let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
    let mut response = plain(Status::MethodNotAllowed, Status::MethodNotAllowed.reason());
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

fn plain(status: Status, body: &str) -> HttpResponse {
    let mut response = http::Response::new(Full::new(Bytes::from(body.to_owned())));
    *response.status_mut() = status.into();
    response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(crate::context::TEXT_CONTENT_TYPE),
    );
    response
}

/// Counts a request as in flight for as long as it lives.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available. A handler that fails to install
/// is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
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
