//! Snapshot acquisition.
//!
//! The inventory comes from an external command (`pbsnodes -a`), a saved
//! dump on disk, or stdin. Command execution is bounded by a timeout and
//! raced against Ctrl-C; any failure is terminal for the invocation and
//! is never retried.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use nodefit_core::config::InventoryConfig;

use crate::error::{InventoryError, InventoryResult};

/// An external inventory command.
#[derive(Debug, Clone)]
pub struct CommandSource {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSource {
    pub fn from_config(config: &InventoryConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run the command once and return its stdout.
    pub async fn fetch(&self) -> InventoryResult<String> {
        self.fetch_until(interrupted()).await
    }

    /// Like [`fetch`](Self::fetch), abandoning the command when `interrupt` resolves.
    pub async fn fetch_until<F>(&self, interrupt: F) -> InventoryResult<String>
    where
        F: Future<Output = ()>,
    {
        info!(program = %self.program, args = ?self.args, timeout_secs = self.timeout.as_secs(), "fetching inventory");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::select! {
            result = tokio::time::timeout(self.timeout, cmd.output()) => match result {
                Ok(Ok(output)) => output,
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(InventoryError::CommandNotFound { program: self.program.clone() });
                }
                Ok(Err(source)) => {
                    return Err(InventoryError::Spawn { program: self.program.clone(), source });
                }
                Err(_) => {
                    warn!(program = %self.program, "inventory command timed out");
                    return Err(InventoryError::Timeout {
                        program: self.program.clone(),
                        secs: self.timeout.as_secs(),
                    });
                }
            },
            _ = interrupt => {
                warn!(program = %self.program, "interrupted while fetching inventory");
                return Err(InventoryError::Interrupted);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
            return Err(InventoryError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: stderr.to_string(),
            });
        }

        debug!(bytes = output.stdout.len(), "inventory command finished");
        String::from_utf8(output.stdout).map_err(|_| InventoryError::NotUtf8 {
            program: self.program.clone(),
        })
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Where the snapshot text comes from.
#[derive(Debug, Clone)]
pub enum InventorySource {
    Command(CommandSource),
    File(PathBuf),
    Stdin,
}

impl InventorySource {
    /// `-` selects stdin, any other path a file; `None` runs the configured command.
    pub fn resolve(input: Option<PathBuf>, config: &InventoryConfig) -> Self {
        match input {
            Some(path) if path.as_os_str() == "-" => InventorySource::Stdin,
            Some(path) => InventorySource::File(path),
            None => InventorySource::Command(CommandSource::from_config(config)),
        }
    }

    pub async fn read(&self) -> InventoryResult<String> {
        match self {
            InventorySource::Command(cmd) => cmd.fetch().await,
            InventorySource::File(path) => {
                debug!(path = %path.display(), "reading inventory file");
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| InventoryError::Read { path: path.clone(), source })
            }
            InventorySource::Stdin => {
                let mut text = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut text)
                    .await
                    .map_err(InventoryError::Stdin)?;
                Ok(text)
            }
        }
    }
}
