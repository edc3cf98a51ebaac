//! Working directory size via `du`.

use camino::Utf8Path;
use rsqueue_parsers::{CommandError, run_command_with_timeout};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("Unexpected du output: {0:?}")]
    Parse(String),
}

/// Measures the total size of a directory in bytes.
pub trait DirectorySize {
    fn directory_size(
        &self,
        dir: &Utf8Path,
    ) -> impl Future<Output = Result<u64, DiskError>> + Send;
}

/// `du -sb`, bounded by a timeout.
#[derive(Debug, Clone)]
pub struct Du {
    pub timeout: Duration,
}

impl Default for Du {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl DirectorySize for Du {
    async fn directory_size(&self, dir: &Utf8Path) -> Result<u64, DiskError> {
        let mut cmd = Command::new("du");
        cmd.arg("-sb").arg(dir.as_str());
        let stdout = run_command_with_timeout(&mut cmd, "du", self.timeout).await?;
        parse_du_output(&stdout)
    }
}

/// Parse `du -s` output (`<bytes>\t<path>`).
fn parse_du_output(stdout: &str) -> Result<u64, DiskError> {
    stdout
        .split_whitespace()
        .next()
        .and_then(|bytes| bytes.parse().ok())
        .ok_or_else(|| DiskError::Parse(stdout.trim().to_string()))
}
