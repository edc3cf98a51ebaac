//! Query a job's description via `scontrol show job`.

use crate::types::{JobDescriptor, JobState};
use camino::Utf8PathBuf;
use rsqueue_parsers::{
    CommandError, TimeParseError, non_empty_string, parse_duration, parse_optional_date,
    run_command_with_timeout,
};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler unavailable: {0}")]
    Unavailable(String),
    #[error("Job not found: {0}")]
    JobNotFound(String),
    #[error("Job {job_id}: missing field {field}")]
    MissingField { job_id: String, field: &'static str },
    #[error("Job {job_id}: invalid {field} value {value:?}")]
    InvalidField {
        job_id: String,
        field: &'static str,
        value: String,
    },
    #[error(transparent)]
    Time(#[from] TimeParseError),
}

/// Source of raw `KEY=VALUE` job records.
pub trait SchedulerQuery {
    /// Return the raw record for `job_id`.
    fn query_job(&self, job_id: &str) -> impl Future<Output = Result<String, SchedulerError>> + Send;
}

/// Queries SLURM through `scontrol show job -o`.
#[derive(Debug, Clone)]
pub struct Scontrol {
    pub timeout: Duration,
}

impl Default for Scontrol {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl SchedulerQuery for Scontrol {
    async fn query_job(&self, job_id: &str) -> Result<String, SchedulerError> {
        let mut cmd = Command::new("scontrol");
        cmd.args(["show", "job", "-o", job_id]);

        match run_command_with_timeout(&mut cmd, "scontrol", self.timeout).await {
            Ok(stdout) => Ok(stdout),
            Err(CommandError::Failed { stderr, .. }) if stderr.contains("Invalid job id") => {
                Err(SchedulerError::JobNotFound(job_id.to_string()))
            }
            Err(e) => Err(SchedulerError::Unavailable(e.to_string())),
        }
    }
}

/// Fetch and parse the description of `job_id`.
pub async fn fetch<Q: SchedulerQuery>(
    query: &Q,
    job_id: &str,
) -> Result<JobDescriptor, SchedulerError> {
    let raw = query.query_job(job_id).await?;
    if raw.trim().is_empty() {
        return Err(SchedulerError::JobNotFound(job_id.to_string()));
    }
    parse_job_record(job_id, &raw)
}

/// Pick the record for `job_id` out of `scontrol show job -o` output.
///
/// A job array prints one line per task. The line whose `JobId` is exactly
/// `job_id` wins; otherwise the first line is used. Lines are never merged.
fn select_record<'a>(job_id: &str, raw: &'a str) -> &'a str {
    let wanted = format!("JobId={job_id}");
    let mut lines = raw.lines().filter(|line| !line.trim().is_empty());
    let first = lines.clone().next().unwrap_or("");
    lines
        .find(|line| line.split_whitespace().any(|token| token == wanted))
        .unwrap_or(first)
}

/// Split a record into `KEY=VALUE` pairs.
///
/// Tokens without `=` belong to the previous value (paths or reasons with
/// embedded spaces).
fn tokenize(raw: &str) -> HashMap<&str, String> {
    let mut fields: HashMap<&str, String> = HashMap::new();
    let mut last: Option<&str> = None;

    for token in raw.split_whitespace() {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                fields.insert(key, value.to_string());
                last = Some(key);
            }
            _ => {
                if let Some(value) = last.and_then(|k| fields.get_mut(k)) {
                    value.push(' ');
                    value.push_str(token);
                }
            }
        }
    }

    fields
}

/// Build a [`JobDescriptor`] from raw `scontrol` output.
///
/// For a job array only one task's line is read, see [`select_record`].
pub fn parse_job_record(job_id: &str, raw: &str) -> Result<JobDescriptor, SchedulerError> {
    let fields = tokenize(select_record(job_id, raw));
    tracing::debug!(job_id, keys = fields.len(), "parsed scontrol record");

    let get = |field: &'static str| -> Result<&str, SchedulerError> {
        fields
            .get(field)
            .map(|v| v.as_str())
            .ok_or_else(|| SchedulerError::MissingField {
                job_id: job_id.to_string(),
                field,
            })
    };

    let time_limit = match get("TimeLimit")? {
        "UNLIMITED" | "Partition_Limit" => None,
        s => Some(parse_duration(s)?),
    };

    let cpus = get("NumCPUs")?;
    let num_cores = cpus
        .parse::<u32>()
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| SchedulerError::InvalidField {
            job_id: job_id.to_string(),
            field: "NumCPUs",
            value: cpus.to_string(),
        })?;

    let working_dir = non_empty_string(get("WorkDir")?).ok_or_else(|| {
        SchedulerError::MissingField {
            job_id: job_id.to_string(),
            field: "WorkDir",
        }
    })?;

    let optional_path = |field: &str| {
        fields
            .get(field)
            .and_then(|v| non_empty_string(v))
            .map(Utf8PathBuf::from)
    };

    Ok(JobDescriptor {
        id: fields
            .get("JobId")
            .cloned()
            .unwrap_or_else(|| job_id.to_string()),
        name: get("JobName")?.to_string(),
        state: JobState::parse(get("JobState")?),
        reason: fields.get("Reason").and_then(|v| non_empty_string(v)),
        submit_time: parse_optional_date(get("SubmitTime")?)?,
        start_time: parse_optional_date(get("StartTime")?)?,
        end_time: parse_optional_date(get("EndTime")?)?,
        time_limit,
        num_cores,
        working_dir: Utf8PathBuf::from(working_dir),
        stdout_path: optional_path("StdOut"),
        stderr_path: optional_path("StdErr"),
    })
}
