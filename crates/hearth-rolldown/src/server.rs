//! Dev server: the output directory plus a server-sent-events change stream.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use hearth::{CHANGE_EVENT, CHANGE_STREAM_PATH};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::error::{Result, bind_error};
use crate::state::SharedState;

/// Open change streams never finish on their own, so shutdown waits at most this long.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// A running server; dropping the handle does not stop it, [`shutdown`](Self::shutdown) does.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task)
            .await
            .is_err()
        {
            self.task.abort();
        }
    }
}

pub fn build_router(state: SharedState) -> Router {
    let files = ServeDir::new(state.outdir());
    Router::new()
        .route(CHANGE_STREAM_PATH, get(handle_change_stream))
        .fallback_service(files)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind `host:port` and serve in a background task.
pub async fn start(state: SharedState, host: &str, port: u16) -> Result<ServerHandle> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|e| bind_error(format!("{host}:{port}"), e))?;
    let addr = listener.local_addr()?;

    let app = build_router(state);
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let shutdown = async {
            let _ = rx.await;
        };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "dev server stopped");
        }
    });

    tracing::debug!(%addr, "dev server listening");
    Ok(ServerHandle {
        addr,
        shutdown: Some(tx),
        task,
    })
}

async fn handle_change_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, "change stream connected");

    let stream = ReceiverStream::new(rx)
        .map(|data| Ok(Event::default().event(CHANGE_EVENT).data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
