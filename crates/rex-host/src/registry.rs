use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::handler::{CommandError, Handler};

/// Process-wide command table.
///
/// Cloning shares the same table. Names enumerate in first-registration order;
/// overwriting a name keeps its position. The lock is only held for the map
/// operation itself, never across a handler call.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: Arc<RwLock<IndexMap<String, Handler>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, Handler)>,
        N: Into<String>,
    {
        let commands = entries
            .into_iter()
            .map(|(name, handler)| (name.into(), handler))
            .collect::<IndexMap<_, _>>();
        Self {
            commands: Arc::new(RwLock::new(commands)),
        }
    }

    pub async fn register(&self, name: impl Into<String>, handler: Handler) {
        let name = name.into();
        tracing::debug!(command = %name, handler = handler.name(), "register command");
        self.commands.write().await.insert(name, handler);
    }

    pub async fn lookup(&self, name: &str) -> Option<Handler> {
        self.commands.read().await.get(name).cloned()
    }

    pub async fn names(&self) -> Vec<String> {
        self.commands.read().await.keys().cloned().collect()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.commands.read().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.commands.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.commands.read().await.is_empty()
    }

    /// Register `new_name` as another name for the handler behind
    /// `existing_name`. Lookup and insert happen under one write lock.
    pub async fn alias(&self, new_name: &str, existing_name: &str) -> Result<(), CommandError> {
        let mut commands = self.commands.write().await;
        let handler = commands
            .get(existing_name)
            .cloned()
            .ok_or_else(|| CommandError::NotFound(existing_name.to_string()))?;
        tracing::debug!(alias = new_name, target = existing_name, "alias command");
        commands.insert(new_name.to_string(), handler);
        Ok(())
    }
}
