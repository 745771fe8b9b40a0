//! HTTP/2 transport. Every request stream is one call: the `payload` header is
//! decoded, dispatched, and answered with the envelope status and body.
//! `axum::serve` accepts HTTP/2 with prior knowledge as well as HTTP/1.1.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use rex_protocol::{CALL_PATH, CONTENT_TYPE_JSON, Envelope, PAYLOAD_HEADER};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::HostConfig;
use crate::dispatch::Dispatcher;
use crate::error::HostError;

/// The path is not part of the call, so every path is routed to the
/// dispatcher.
pub fn router(dispatcher: Dispatcher) -> Router {
    Router::new()
        .route(CALL_PATH, any(call))
        .fallback(call)
        .with_state(dispatcher)
}

async fn call(State(dispatcher): State<Dispatcher>, headers: HeaderMap) -> Response {
    let payload = headers.get(PAYLOAD_HEADER).map(|value| value.as_bytes());
    envelope_response(dispatcher.respond_payload(payload).await)
}

fn envelope_response(envelope: Envelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)],
        envelope.body,
    )
        .into_response()
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, HostError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| HostError::Bind { addr, source })
}

pub async fn serve(
    listener: TcpListener,
    app: Router,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), HostError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await
        .map_err(|e| HostError::Serve(e.to_string()))
}

/// Running server task plus the means to stop it.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<Result<(), HostError>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should call.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) -> Result<(), HostError> {
        let _ = self.shutdown_tx.send(());
        join(self.task).await
    }

    /// Serve until `signal` resolves or the server stops on its own.
    pub async fn run_until(mut self, signal: impl Future<Output = ()>) -> Result<(), HostError> {
        tokio::select! {
            joined = &mut self.task => return flatten(joined),
            _ = signal => {}
        }
        tracing::info!("shutting down");
        self.shutdown().await
    }
}

async fn join(task: JoinHandle<Result<(), HostError>>) -> Result<(), HostError> {
    flatten(task.await)
}

fn flatten(
    joined: Result<Result<(), HostError>, tokio::task::JoinError>,
) -> Result<(), HostError> {
    joined.map_err(|e| HostError::Serve(format!("server task: {e}")))?
}

/// Start a server with the built-in commands as described by `config`.
pub async fn spawn_server(config: &HostConfig) -> Result<ServerHandle, HostError> {
    let workdir = config.initial_workdir()?;
    tracing::info!(workdir = %workdir.display(), "initial working directory");
    spawn_dispatcher(config.bind, Dispatcher::with_builtins(workdir)).await
}

/// Start a server for an existing dispatcher. Binding port 0 picks a free
/// port; [`ServerHandle::local_addr`] reports it.
pub async fn spawn_dispatcher(
    addr: SocketAddr,
    dispatcher: Dispatcher,
) -> Result<ServerHandle, HostError> {
    let listener = bind(addr).await?;
    let addr = listener
        .local_addr()
        .map_err(|source| HostError::Bind { addr, source })?;
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let app = router(dispatcher);
    tracing::info!("rex host listening on http://{}", addr);
    let task = tokio::spawn(serve(listener, app, shutdown_rx));
    Ok(ServerHandle {
        addr,
        shutdown_tx,
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (TempDir, Router) {
        let tmp = TempDir::new().unwrap();
        let root = std::fs::canonicalize(tmp.path()).unwrap();
        (tmp, router(Dispatcher::with_builtins(root)))
    }

    async fn send(app: Router, uri: &str, payload: Option<&str>) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().uri(uri);
        if let Some(payload) = payload {
            builder = builder.header(PAYLOAD_HEADER, payload);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            CONTENT_TYPE_JSON
        );
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn success_is_200_with_json_body() {
        let (_tmp, app) = app();
        let (status, body) = send(
            app,
            "/",
            Some(r#"{"method":"add","args":["2","3.5","foo"]}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"5.5");
    }

    #[tokio::test]
    async fn unknown_method_is_500_false() {
        let (_tmp, app) = app();
        let (status, body) = send(app, "/", Some(r#"{"method":"cat","args":[]}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, b"false");
    }

    #[tokio::test]
    async fn missing_or_malformed_payload_is_500_false() {
        let (_tmp, app) = app();
        let (status, body) = send(app.clone(), "/", None).await;
        assert_eq!((status, body.as_slice()), (StatusCode::INTERNAL_SERVER_ERROR, &b"false"[..]));
        let (status, body) = send(app, "/", Some("{\"method\":")).await;
        assert_eq!((status, body.as_slice()), (StatusCode::INTERNAL_SERVER_ERROR, &b"false"[..]));
    }

    #[tokio::test]
    async fn any_path_reaches_the_dispatcher() {
        let (_tmp, app) = app();
        let (status, body) = send(app, "/some/where", Some(r#"{"method":"add","args":["1"]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"1");
    }
}
