//! One poll cycle: scheduler query, progress extraction, projection.

use chrono::{DateTime, Utc};
use rsqueue_core::{
    DirectorySize, EtaProjection, JobPhase, ProgressError, ProgressOutcome, extract_progress,
    project,
};
use rsqueue_slurm::{JobDescriptor, SchedulerError, SchedulerQuery, fetch};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Job {job_id}: {source}")]
    Progress {
        job_id: String,
        #[source]
        source: ProgressError,
    },
}

/// Configuration for a poll cycle.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Measure the working directory size of progressing jobs.
    pub measure_storage: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            measure_storage: true,
        }
    }
}

/// Everything learned about one job in one poll.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: JobDescriptor,
    pub phase: JobPhase,
    pub progress: Option<ProgressOutcome>,
    pub projection: Option<EtaProjection>,
}

/// Poll a single job.
///
/// Scheduler failures and configuration errors end the poll; a failed
/// directory size measurement only drops the size estimates.
pub async fn poll_job<Q, D>(
    scheduler: &Q,
    disk: &D,
    config: &PollConfig,
    job_id: &str,
    now: DateTime<Utc>,
) -> Result<JobReport, PollError>
where
    Q: SchedulerQuery,
    D: DirectorySize,
{
    let job = fetch(scheduler, job_id).await?;
    tracing::debug!(job_id, state = %job.state, dir = %job.working_dir, "fetched job");

    let progress = if job.state.is_running() {
        Some(
            extract_progress(&job, now).map_err(|source| PollError::Progress {
                job_id: job.id.clone(),
                source,
            })?,
        )
    } else {
        None
    };
    let phase = JobPhase::classify(&job.state, progress.as_ref());

    let projection = match progress.as_ref().and_then(|p| p.snapshot()) {
        Some(snapshot) => {
            let size = if config.measure_storage {
                match disk.directory_size(&job.working_dir).await {
                    Ok(size) => Some(size),
                    Err(e) => {
                        tracing::warn!(job_id, "Failed to measure {}: {}", job.working_dir, e);
                        None
                    }
                }
            } else {
                None
            };
            Some(project(snapshot, &job, size))
        }
        None => None,
    };

    Ok(JobReport {
        job,
        phase,
        progress,
        projection,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8Path;
    use chrono::TimeZone;
    use rsqueue_core::{CONTROLS_FILE, COUNTERS_FILE, DiskError};
    use std::fs;
    use tempfile::TempDir;

    struct FakeScheduler(String);

    impl SchedulerQuery for FakeScheduler {
        async fn query_job(&self, _job_id: &str) -> Result<String, SchedulerError> {
            Ok(self.0.clone())
        }
    }

    struct FixedSize(Option<u64>);

    impl DirectorySize for FixedSize {
        async fn directory_size(&self, _dir: &Utf8Path) -> Result<u64, DiskError> {
            self.0.ok_or_else(|| DiskError::Parse(String::new()))
        }
    }

    fn record(state: &str, dir: &TempDir) -> String {
        format!(
            "JobId=77 JobName=ship JobState={state} Reason=None TimeLimit=1-00:00:00 \
             SubmitTime=2024-05-01T00:00:00 StartTime=2024-05-01T00:00:00 \
             EndTime=2024-05-02T00:00:00 NumCPUs=16 WorkDir={} \
             StdOut=/dev/null StdErr=/dev/null",
            dir.path().display()
        )
    }

    fn refresco_dir(rows: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONTROLS_FILE),
            "<controls><outerLoop><maxIteration>100</maxIteration></outerLoop>\
             <timeLoop><unsteady>false</unsteady></timeLoop></controls>",
        )
        .unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), format!("#a\n#b\n{rows}")).unwrap();
        dir
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_poll_progressing_job() {
        let dir = refresco_dir("0 1.0\n50 0.1\n");
        let scheduler = FakeScheduler(record("RUNNING", &dir));
        let report = poll_job(&scheduler, &FixedSize(Some(2048)), &PollConfig::default(), "77", now())
            .await
            .unwrap();

        assert_eq!(report.phase, JobPhase::Progressing);
        let projection = report.projection.unwrap();
        assert_eq!(projection.time_remaining.map(|d| d.as_secs()), Some(10 * 3600));
        assert_eq!(projection.eta_directory_size, Some(4096));
    }

    #[tokio::test]
    async fn test_poll_without_storage() {
        let dir = refresco_dir("0 1.0\n50 0.1\n");
        let scheduler = FakeScheduler(record("RUNNING", &dir));
        let config = PollConfig {
            measure_storage: false,
        };

        let report = poll_job(&scheduler, &FixedSize(Some(999)), &config, "77", now())
            .await
            .unwrap();
        let projection = report.projection.unwrap();
        assert_eq!(projection.current_directory_size, None);
        assert!(projection.eta.is_some());
    }

    #[tokio::test]
    async fn test_failed_du_keeps_projection() {
        let dir = refresco_dir("0 1.0\n50 0.1\n");
        let scheduler = FakeScheduler(record("RUNNING", &dir));
        let report = poll_job(&scheduler, &FixedSize(None), &PollConfig::default(), "77", now())
            .await
            .unwrap();
        let projection = report.projection.unwrap();
        assert_eq!(projection.eta_directory_size, None);
        assert!(projection.eta.is_some());
    }

    #[tokio::test]
    async fn test_poll_awaiting_and_finished_jobs() {
        let dir = refresco_dir("");
        let running = FakeScheduler(record("RUNNING", &dir));
        let report = poll_job(&running, &FixedSize(Some(1)), &PollConfig::default(), "77", now())
            .await
            .unwrap();
        assert_eq!(report.phase, JobPhase::AwaitingData);
        assert!(report.projection.is_none());

        let done = FakeScheduler(record("COMPLETED", &dir));
        let report = poll_job(&done, &FixedSize(Some(1)), &PollConfig::default(), "77", now())
            .await
            .unwrap();
        assert_eq!(report.phase, JobPhase::Finished { success: true });
        assert!(report.progress.is_none());
    }

    #[tokio::test]
    async fn test_poll_surfaces_config_errors() {
        let dir = refresco_dir("0 1.0\n");
        fs::write(dir.path().join(CONTROLS_FILE), "<controls/>").unwrap();
        let scheduler = FakeScheduler(record("RUNNING", &dir));
        let result = poll_job(&scheduler, &FixedSize(None), &PollConfig::default(), "77", now()).await;
        assert!(matches!(
            result,
            Err(PollError::Progress {
                source: ProgressError::ConfigPathMissing(_),
                ..
            })
        ));
    }
}
