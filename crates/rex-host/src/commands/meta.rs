//! Commands that inspect or extend the registry itself.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Builtin, builtin, required};
use crate::context::CommandContext;
use crate::handler::{CommandHandler, CommandResult};

builtin!(ListCommands, "commands");
builtin!(Pipe, "pipe");
builtin!(Alias, "alias");

#[async_trait]
impl CommandHandler for ListCommands {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, _args: Vec<String>) -> CommandResult {
        Ok(Some(json!(ctx.registry().names().await)))
    }
}

/// Accepts anything, returns nothing.
#[async_trait]
impl CommandHandler for Pipe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, _ctx: &CommandContext, _args: Vec<String>) -> CommandResult {
        Ok(None)
    }
}

/// `alias <new> <existing>`
#[async_trait]
impl CommandHandler for Alias {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let new_name = required(&args, 0, "new")?;
        let existing = required(&args, 1, "existing")?;
        ctx.registry().alias(new_name, existing).await?;
        tracing::info!(alias = new_name, target = existing, "alias registered");
        Ok(Some(Value::Bool(true)))
    }
}
