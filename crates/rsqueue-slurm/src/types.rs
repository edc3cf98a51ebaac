//! SLURM job types.

use camino::Utf8PathBuf;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// SLURM job state as reported by `scontrol`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobState {
    Pending,
    Running,
    Suspended,
    Completing,
    Completed,
    Failed,
    Cancelled,
    Timeout,
    OutOfMemory,
    NodeFail,
    Preempted,
    Unknown(String),
}

impl JobState {
    /// Parse a SLURM state string (long or short form).
    pub fn parse(s: &str) -> Self {
        // States can carry suffixes like "CANCELLED by 12345"
        let base = s.split_whitespace().next().unwrap_or(s);
        match base.to_uppercase().as_str() {
            "PENDING" | "PD" => Self::Pending,
            "RUNNING" | "R" => Self::Running,
            "SUSPENDED" | "S" => Self::Suspended,
            "COMPLETING" | "CG" => Self::Completing,
            "COMPLETED" | "CD" => Self::Completed,
            "FAILED" | "F" | "BOOT_FAIL" | "BF" | "DEADLINE" | "DL" => Self::Failed,
            "CANCELLED" | "CA" => Self::Cancelled,
            "TIMEOUT" | "TO" => Self::Timeout,
            "OUT_OF_MEMORY" | "OOM" => Self::OutOfMemory,
            "NODE_FAIL" | "NF" => Self::NodeFail,
            "PREEMPTED" | "PR" => Self::Preempted,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether the job has left the queue for good.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Completed
                | Self::Failed
                | Self::Cancelled
                | Self::Timeout
                | Self::OutOfMemory
                | Self::NodeFail
                | Self::Preempted
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Suspended => "SUSPENDED",
            Self::Completing => "COMPLETING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Timeout => "TIMEOUT",
            Self::OutOfMemory => "OUT_OF_MEMORY",
            Self::NodeFail => "NODE_FAIL",
            Self::Preempted => "PREEMPTED",
            Self::Unknown(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Snapshot of one SLURM job.
///
/// Built once per poll from `scontrol` output; polling again builds a new
/// descriptor rather than updating this one.
#[derive(Debug, Clone, Serialize)]
pub struct JobDescriptor {
    /// SLURM job ID
    pub id: String,

    /// Job name
    pub name: String,

    /// Job state
    pub state: JobState,

    /// Pending/failure reason, if SLURM gave one
    pub reason: Option<String>,

    /// Submit time
    pub submit_time: Option<DateTime<Utc>>,

    /// Start time (an estimate while pending)
    pub start_time: Option<DateTime<Utc>>,

    /// End time (the time limit deadline while running)
    pub end_time: Option<DateTime<Utc>>,

    /// Time limit, None when UNLIMITED
    pub time_limit: Option<Duration>,

    /// Allocated CPUs
    pub num_cores: u32,

    /// Working directory of the job
    pub working_dir: Utf8PathBuf,

    pub stdout_path: Option<Utf8PathBuf>,

    pub stderr_path: Option<Utf8PathBuf>,
}

impl JobDescriptor {
    /// Wall time between start and `now`, if the job has started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        let start = self.start_time?;
        (now - start).to_std().ok()
    }
}
