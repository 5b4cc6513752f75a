//! HTTP server binding an `App` to a TCP listener through axum.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    response::Response,
    routing::any,
};
use bytes::Bytes;
use http::{Request, StatusCode};
use quiver_engine::{App, Environment, Lifecycle, RuntimeKind};
use tokio::sync::mpsc;
use tracing::info;

use crate::lifecycle::TokioLifecycle;

/// Request bodies beyond this are rejected before reaching the engine.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            hostname: "127.0.0.1".into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("failed to bind listener: {0}")]
    Bind(#[from] std::io::Error),
}

struct AppState {
    app: App,
    env: Option<Arc<Environment>>,
    lifecycle: Arc<TokioLifecycle>,
}

/// The running GraphQL server — owns the listener task and the bound port.
pub struct GraphQLServer {
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
    port: u16,
}

impl GraphQLServer {
    /// Start serving `app` on the configured address.
    pub async fn start(config: ServerConfig, app: App) -> Result<Self, ServerError> {
        Self::start_with_env(config, app, None).await
    }

    /// Start serving `app` with a host environment snapshot handed to every
    /// request.
    pub async fn start_with_env(
        config: ServerConfig,
        mut app: App,
        env: Option<Arc<Environment>>,
    ) -> Result<Self, ServerError> {
        app.set_runtime(RuntimeKind::Native);

        let state = Arc::new(AppState {
            app,
            env,
            lifecycle: Arc::new(TokioLifecycle),
        });

        let router = Router::new()
            .route("/", any(graphql_handler))
            .route("/graphql", any(graphql_handler))
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        info!("GraphQL server listening on http://{}:{}/graphql", config.hostname, port);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port,
        })
    }

    /// The actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gracefully stop the server.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("GraphQL server stopped");
    }
}

/// `listen`-style convenience: bind `app` on `port` at localhost and return
/// the running server.
pub async fn serve(port: u16, app: App) -> Result<GraphQLServer, ServerError> {
    GraphQLServer::start(
        ServerConfig {
            port,
            ..ServerConfig::default()
        },
        app,
    )
    .await
}

/// Buffer the inbound body, hand the request to the engine, and stream the
/// engine's response back. Every method is routed here; the engine performs
/// its own method gating.
async fn graphql_handler(
    State(state): State<Arc<AppState>>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "request body rejected");
            return Response::builder()
                .status(StatusCode::PAYLOAD_TOO_LARGE)
                .body(Body::from("request body too large"))
                .unwrap_or_default();
        }
    };

    let lifecycle: Arc<dyn Lifecycle> = state.lifecycle.clone();
    let request: Request<Bytes> = Request::from_parts(parts, bytes);
    state
        .app
        .fetch(request, state.env.clone(), Some(lifecycle))
        .await
        .map(Body::from)
}
