//! Motor control HTTP server.
//!
//! This module provides the axum server that:
//! - Serves the control panel at `/`
//! - Maps `/motor/speed` and `/motor/direction` onto the [`ControlPlane`]
//! - Starts and stops on demand, idempotently

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use motorctl_core::{ActivityIndicator, ControlSurface, MotorHardware};
use motorctl_protocol::command::{DIRECTION_PATH, PANEL_PATH, SPEED_PATH};
use motorctl_protocol::{Command, ControlPlane, Reply};

/// Configuration for the control server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Errors starting the control server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called outside a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,
}

/// Shared state of every route handler.
pub type SharedPlane<H, I> = Arc<ControlPlane<H, I>>;

/// Build the control-plane router.
pub fn router<H, I>(plane: SharedPlane<H, I>) -> Router
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    Router::new()
        .route(PANEL_PATH, get(panel_handler::<H, I>))
        .route(SPEED_PATH, get(speed_handler::<H, I>))
        .route(DIRECTION_PATH, get(direction_handler::<H, I>))
        .with_state(plane)
}

/// Handler for `/`.
async fn panel_handler<H, I>(State(plane): State<SharedPlane<H, I>>) -> Response
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    respond(plane, Command::ShowPanel).await
}

/// Handler for `/motor/speed`.
async fn speed_handler<H, I>(
    State(plane): State<SharedPlane<H, I>>,
    RawQuery(query): RawQuery,
) -> Response
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    respond(plane, Command::speed(query.as_deref())).await
}

/// Handler for `/motor/direction`.
async fn direction_handler<H, I>(
    State(plane): State<SharedPlane<H, I>>,
    RawQuery(query): RawQuery,
) -> Response
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    respond(plane, Command::direction(query.as_deref())).await
}

/// Run a command off the async workers and turn the reply into a response.
///
/// The indicator may block and the motor lock may be contended, so the
/// command runs on the blocking pool.
async fn respond<H, I>(plane: SharedPlane<H, I>, command: Command) -> Response
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    debug!(?command, "control request");
    let result = tokio::task::spawn_blocking(move || plane.execute(&command)).await;

    match result {
        Ok(Ok(reply)) => reply_response(reply),
        Ok(Err(e)) => {
            error!("motor hardware failure: {e}");
            std::process::abort();
        }
        Err(e) => {
            error!("control task failed: {e}");
            std::process::abort();
        }
    }
}

fn reply_response(reply: Reply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::OK);
    (status, [(header::CONTENT_TYPE, reply.content_type)], reply.body).into_response()
}

struct Running {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// The motor control HTTP server.
///
/// `start` and `stop` are idempotent so the link supervisor can call them on
/// every link transition.
///
/// The listening socket is bound on the first `start` and kept until
/// [`ControlServer::shutdown`]. `stop` only ends serving: the stopped task
/// drains in the background while a following `start` serves the same
/// socket again, so a link bounce never hits a port still held by the old
/// task. Connections arriving while stopped wait in the backlog.
pub struct ControlServer<H, I> {
    config: ServerConfig,
    plane: SharedPlane<H, I>,
    socket: Option<std::net::TcpListener>,
    running: Option<Running>,
    draining: Vec<JoinHandle<()>>,
}

impl<H, I> ControlServer<H, I>
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    /// Create a stopped server.
    pub fn new(config: ServerConfig, plane: SharedPlane<H, I>) -> Self {
        Self {
            config,
            plane,
            socket: None,
            running: None,
            draining: Vec::new(),
        }
    }

    /// Get the shared control plane.
    pub fn plane(&self) -> SharedPlane<H, I> {
        self.plane.clone()
    }

    /// Address actually bound, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|r| r.local_addr)
    }

    /// Stop, wait for every serving task to finish and close the socket.
    pub async fn shutdown(&mut self) {
        self.stop();
        let tasks = std::mem::take(&mut self.draining);
        let stopped = !tasks.is_empty();
        for task in tasks {
            if let Err(e) = task.await {
                warn!("control server task ended abnormally: {e}");
            }
        }
        if self.socket.take().is_some() || stopped {
            info!("control server stopped");
        }
    }

    fn spawn(&mut self) -> Result<(), ServerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ServerError::NoRuntime)?;
        let addr = self.config.bind_addr;
        let bind_err = |source: std::io::Error| ServerError::Bind { addr, source };

        self.draining.retain(|task| !task.is_finished());
        let socket = match self.socket.take() {
            Some(socket) => socket,
            None => {
                let socket = std::net::TcpListener::bind(addr).map_err(bind_err)?;
                socket.set_nonblocking(true).map_err(bind_err)?;
                socket
            }
        };
        let local_addr = socket.local_addr().map_err(bind_err)?;
        let listener = socket.try_clone().map_err(bind_err)?;
        self.socket = Some(socket);

        let _guard = runtime.enter();
        let listener = tokio::net::TcpListener::from_std(listener).map_err(bind_err)?;

        let app = router(self.plane.clone());
        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("control server error: {e}");
            }
        });

        info!("control server listening on {local_addr}");
        self.running = Some(Running {
            local_addr,
            shutdown,
            task,
        });
        Ok(())
    }
}

impl<H, I> ControlSurface for ControlServer<H, I>
where
    H: MotorHardware + 'static,
    I: ActivityIndicator + 'static,
{
    type Error = ServerError;

    fn start(&mut self) -> Result<(), ServerError> {
        if self.running.is_some() {
            debug!("control server already running");
            return Ok(());
        }
        self.spawn()
    }

    fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.shutdown.send(());
            self.draining.push(running.task);
            info!("control server stopping");
        }
    }

    fn is_running(&self) -> bool {
        self.running.is_some()
    }
}
