//! Resolves a request to its handler and normalizes the outcome into an
//! [`Envelope`].
//!
//! Every failure (unknown method, handler error, handler panic, undecodable
//! request, unencodable result) becomes the same `500 false` envelope. A
//! handler returning `false` is a success.

use std::path::PathBuf;

use rex_protocol::{Envelope, ProtocolError, Request, encode_result};
use thiserror::Error;

use crate::commands::builtin_registry;
use crate::context::CommandContext;
use crate::handler::CommandError;
use crate::registry::CommandRegistry;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("handler not found: {0:?}")]
    HandlerNotFound(String),
    #[error("handler {method} failed: {source}")]
    HandlerExecution {
        method: String,
        #[source]
        source: CommandError,
    },
    #[error("handler {method} panicked")]
    HandlerPanicked { method: String },
    #[error("missing {0} header")]
    MissingPayload(&'static str),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Clone)]
pub struct Dispatcher {
    ctx: CommandContext,
}

impl Dispatcher {
    pub fn new(ctx: CommandContext) -> Self {
        Self { ctx }
    }

    /// Dispatcher over a fresh registry holding the built-in commands.
    pub fn with_builtins(workdir: PathBuf) -> Self {
        Self::new(CommandContext::new(builtin_registry(), workdir))
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.ctx.registry()
    }

    /// Look up and run the handler for `request`.
    ///
    /// The handler runs on its own task so slow I/O does not hold up other
    /// requests and a panic is contained to this call.
    pub async fn dispatch(
        &self,
        request: Request,
    ) -> Result<Option<serde_json::Value>, DispatchError> {
        let Request { method, args } = request;
        let handler = self
            .ctx
            .registry()
            .lookup(&method)
            .await
            .ok_or_else(|| DispatchError::HandlerNotFound(method.clone()))?;

        let ctx = self.ctx.clone();
        let task = tokio::spawn(async move { handler.call(&ctx, args).await });
        match task.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => Err(DispatchError::HandlerExecution { method, source }),
            Err(join_err) => {
                tracing::error!(%method, "handler task aborted: {join_err}");
                Err(DispatchError::HandlerPanicked { method })
            }
        }
    }

    /// Dispatch and encode, folding every error into the failure envelope.
    pub async fn respond(&self, request: Request) -> Envelope {
        tracing::info!(method = %request.method, args = ?request.args, "dispatch");
        let method = request.method.clone();
        let outcome = match self.dispatch(request).await {
            Ok(value) => encode_result(value.as_ref()).map_err(DispatchError::from),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(body) => Envelope::success(body),
            Err(err) => {
                tracing::warn!(%method, "call failed: {err}");
                Envelope::failure()
            }
        }
    }

    /// Decode the raw `payload` header value, then [`Dispatcher::respond`].
    pub async fn respond_payload(&self, payload: Option<&[u8]>) -> Envelope {
        match decode_payload(payload) {
            Ok(request) => self.respond(request).await,
            Err(err) => {
                tracing::warn!("rejected request: {err}");
                Envelope::failure()
            }
        }
    }
}

fn decode_payload(payload: Option<&[u8]>) -> Result<Request, DispatchError> {
    let bytes = payload.ok_or(DispatchError::MissingPayload(rex_protocol::PAYLOAD_HEADER))?;
    Ok(Request::from_header_bytes(bytes)?)
}
