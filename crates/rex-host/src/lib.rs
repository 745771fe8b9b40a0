pub mod commands;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod registry;

pub use config::HostConfig;
pub use context::CommandContext;
pub use dispatch::{DispatchError, Dispatcher};
pub use error::HostError;
pub use handler::{CommandError, CommandHandler, CommandResult, Handler, handler_fn};
pub use http::{ServerHandle, router, spawn_dispatcher, spawn_server};
pub use registry::CommandRegistry;
