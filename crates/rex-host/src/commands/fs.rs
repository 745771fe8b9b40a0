//! Filesystem commands. Every path is resolved against the context working
//! directory, and all I/O goes through `tokio::fs`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Builtin, builtin, required};
use crate::context::CommandContext;
use crate::handler::{CommandError, CommandHandler, CommandResult};

builtin!(ListDir, "ls");
builtin!(MakeDir, "mkdir");
builtin!(Remove, "rm");
builtin!(Touch, "touch");
builtin!(ChangeDir, "cd");
builtin!(WorkDir, "pwd");

/// `ls [path]`: sorted entry names. An unreadable directory fails the call.
#[async_trait]
impl CommandHandler for ListDir {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let raw = args.first().map(String::as_str).unwrap_or(".");
        let dir = ctx.resolve(raw).await;
        let names = list_dir(&dir).await?;
        Ok(Some(json!(names)))
    }
}

/// `mkdir <dir>`: `false` when the directory cannot be created.
#[async_trait]
impl CommandHandler for MakeDir {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let dir = ctx.resolve(required(&args, 0, "dir")?).await;
        Ok(Some(reported(tokio::fs::create_dir(&dir).await, "mkdir", &dir)))
    }
}

/// `rm <path>`: recursive, idempotent, never fails the call. Paths that hold
/// the working directory are refused with `false`.
#[async_trait]
impl CommandHandler for Remove {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let Some(raw) = args.first() else {
            return Ok(Some(Value::Bool(false)));
        };
        let path = ctx.resolve(raw).await;
        if ctx.workdir().await.starts_with(&path) {
            tracing::debug!(path = %path.display(), "rm refused: contains working directory");
            return Ok(Some(Value::Bool(false)));
        }
        Ok(Some(reported(remove_recursive(&path).await, "rm", &path)))
    }
}

/// `touch <file...>`: creates or truncates each file, all or nothing.
///
/// Every target is opened before any existing file is truncated. On the first
/// open failure, files this call created are removed again and existing files
/// are left as they were.
#[async_trait]
impl CommandHandler for Touch {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let mut created: Vec<PathBuf> = Vec::new();
        let mut existing: Vec<(PathBuf, tokio::fs::File)> = Vec::new();
        for raw in &args {
            let path = ctx.resolve(raw).await;
            // An inconclusive check counts as existing so rollback never deletes it.
            let existed = tokio::fs::try_exists(&path).await.unwrap_or(true);
            let opened = tokio::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(false)
                .open(&path)
                .await;
            match opened {
                Ok(file) if existed => existing.push((path, file)),
                Ok(_) => created.push(path),
                Err(err) => {
                    tracing::debug!(path = %path.display(), "touch failed: {err}");
                    rollback(&created).await;
                    return Ok(Some(Value::Bool(false)));
                }
            }
        }
        for (path, file) in &existing {
            if let Err(err) = file.set_len(0).await {
                tracing::debug!(path = %path.display(), "touch truncate failed: {err}");
                rollback(&created).await;
                return Ok(Some(Value::Bool(false)));
            }
        }
        Ok(Some(Value::Bool(true)))
    }
}

async fn rollback(created: &[PathBuf]) {
    for path in created.iter().rev() {
        let _ = tokio::fs::remove_file(path).await;
    }
}

/// `cd <path>`: `true` once the working directory has moved.
#[async_trait]
impl CommandHandler for ChangeDir {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, args: Vec<String>) -> CommandResult {
        let Some(raw) = args.first() else {
            return Ok(Some(Value::Bool(false)));
        };
        match ctx.change_dir(raw).await {
            Ok(dir) => {
                tracing::info!(workdir = %dir.display(), "working directory changed");
                Ok(Some(Value::Bool(true)))
            }
            Err(err) => {
                tracing::debug!("cd failed: {err}");
                Ok(Some(Value::Bool(false)))
            }
        }
    }
}

#[async_trait]
impl CommandHandler for WorkDir {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn call(&self, ctx: &CommandContext, _args: Vec<String>) -> CommandResult {
        let dir = ctx.workdir().await;
        Ok(Some(Value::String(dir.to_string_lossy().into_owned())))
    }
}

async fn list_dir(dir: &Path) -> Result<Vec<String>, CommandError> {
    let mut read_dir = tokio::fs::read_dir(dir)
        .await
        .map_err(|err| CommandError::io("ls", dir, err))?;
    let mut names = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(|err| CommandError::io("ls", dir, err))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

async fn remove_recursive(path: &Path) -> std::io::Result<()> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Fold an I/O outcome into the boolean a handler reports.
fn reported(result: std::io::Result<()>, op: &'static str, path: &Path) -> Value {
    match result {
        Ok(()) => Value::Bool(true),
        Err(err) => {
            tracing::debug!(path = %path.display(), "{op} failed: {err}");
            Value::Bool(false)
        }
    }
}
