//! Command execution utilities for scheduler and disk queries.

use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Error type for command execution.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {command}: {error}")]
    Execution { command: String, error: String },
    #[error("Command {command} failed: {stderr}")]
    Failed { command: String, stderr: String },
    #[error("Command {command} did not finish within {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

/// Execute a command and return stdout as a string.
///
/// This is a convenience wrapper that handles common error cases
/// and UTF-8 conversion for command output.
pub async fn run_command(cmd: &mut Command, name: &str) -> Result<String, CommandError> {
    tracing::debug!(command = name, "running command");
    let output = cmd.output().await.map_err(|e| CommandError::Execution {
        command: name.to_string(),
        error: e.to_string(),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandError::Failed {
            command: name.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Like [`run_command`], but gives up after `timeout`.
///
/// The child is killed when the timeout fires.
pub async fn run_command_with_timeout(
    cmd: &mut Command,
    name: &str,
    timeout: Duration,
) -> Result<String, CommandError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, run_command(cmd, name)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(command = name, ?timeout, "command timed out");
            Err(CommandError::Timeout {
                command: name.to_string(),
                timeout,
            })
        }
    }
}
