use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rex_protocol::ProtocolError;
use thiserror::Error;

use crate::context::CommandContext;

/// `Ok(Some(_))` is a JSON result, `Ok(None)` means the command produced no
/// value. `Ok(Some(false))` is a handler reporting failure through its result,
/// which is still a successful call.
pub type CommandResult = Result<Option<serde_json::Value>, CommandError>;

/// Shared handler reference. Aliases clone the `Arc`, never the handler.
pub type Handler = Arc<dyn CommandHandler>;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Name the handler was written under. Aliases keep reporting this name.
    fn name(&self) -> &str;
    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult;
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing argument <{0}>")]
    MissingArgument(&'static str),
    #[error("handler not found: {0}")]
    NotFound(String),
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl CommandError {
    pub fn io(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Handler backed by an async closure. The closure receives an owned context
/// clone so the returned future can be `'static`.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(CommandContext, Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        (self.f)(ctx.clone(), args).await
    }
}

pub fn handler_fn<F, Fut>(name: impl Into<String>, f: F) -> Handler
where
    F: Fn(CommandContext, Vec<String>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CommandResult> + Send + 'static,
{
    Arc::new(FnHandler {
        name: name.into(),
        f,
    })
}
