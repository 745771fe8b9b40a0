//! Shared state handed to every command invocation.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::handler::CommandError;
use crate::registry::CommandRegistry;

/// Registry handle plus the server-side working directory.
///
/// The working directory is always absolute and canonical. It only changes
/// through [`CommandContext::change_dir`], which leaves it untouched on error.
#[derive(Clone)]
pub struct CommandContext {
    registry: CommandRegistry,
    workdir: Arc<RwLock<PathBuf>>,
}

impl CommandContext {
    /// `workdir` must already be an absolute directory path.
    pub fn new(registry: CommandRegistry, workdir: PathBuf) -> Self {
        Self {
            registry,
            workdir: Arc::new(RwLock::new(workdir)),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub async fn workdir(&self) -> PathBuf {
        self.workdir.read().await.clone()
    }

    /// Resolve `raw` against the working directory. Absolute paths replace the
    /// base; `.` and `..` are folded lexically.
    pub async fn resolve(&self, raw: &str) -> PathBuf {
        let base = self.workdir.read().await;
        resolve_against(&base, raw)
    }

    /// Move the working directory to `raw`, resolved against the current one.
    pub async fn change_dir(&self, raw: &str) -> Result<PathBuf, CommandError> {
        let mut workdir = self.workdir.write().await;
        let target = resolve_against(&workdir, raw);
        let canonical = tokio::fs::canonicalize(&target)
            .await
            .map_err(|err| CommandError::io("cd", &target, err))?;
        let metadata = tokio::fs::metadata(&canonical)
            .await
            .map_err(|err| CommandError::io("cd", &canonical, err))?;
        if !metadata.is_dir() {
            return Err(CommandError::io(
                "cd",
                &canonical,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
        *workdir = canonical.clone();
        Ok(canonical)
    }
}

pub(crate) fn resolve_against(base: &Path, raw: &str) -> PathBuf {
    normalize_lexical(&base.join(raw))
}

/// `..` at the root stays at the root.
fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(value) => out.push(value),
        }
    }
    out
}
