//! Progress extraction from a job's working directory.

use crate::controls::{Controls, SimulationMode};
use crate::counters::read_counters;
use chrono::{DateTime, Utc};
use rsqueue_slurm::JobDescriptor;
use serde::Serialize;
use std::io;
use thiserror::Error;

/// Configuration document marking a ReFRESCO run.
pub const CONTROLS_FILE: &str = "controls.xml";

/// Counters (residuals) file appended once per step.
pub const COUNTERS_FILE: &str = "residuals.dat";

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid controls.xml: {0}")]
    ControlsXml(#[from] roxmltree::Error),
    #[error("controls.xml has no {0} element")]
    ConfigPathMissing(String),
    #[error("controls.xml {path} has invalid value {value:?}")]
    InvalidConfigValue { path: String, value: String },
    #[error("No sample yet: {0}")]
    MissingData(String),
    #[error("Counters went backwards: first step {initial}, latest step {current}")]
    InconsistentSteps { initial: u64, current: u64 },
}

/// Step counts of a recognized run at one point in time.
///
/// `initial_step <= current_step`; equality means no step has completed
/// since the counters file was started.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub mode: SimulationMode,
    pub initial_step: u64,
    pub current_step: u64,
    pub max_step: u64,
    pub sample_time: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Steps completed since the first sample.
    pub fn steps_done(&self) -> u64 {
        self.current_step - self.initial_step
    }

    pub fn has_progress(&self) -> bool {
        self.current_step > self.initial_step
    }
}

/// What a working directory tells us about a job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressOutcome {
    /// Not running, or not a ReFRESCO run. Nothing was parsed.
    NotRecognized,
    /// A ReFRESCO run that has not written its first sample.
    AwaitingData { mode: SimulationMode, max_step: u64 },
    Progress(ProgressSnapshot),
}

impl ProgressOutcome {
    pub fn is_recognized_engine(&self) -> bool {
        !matches!(self, Self::NotRecognized)
    }

    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        match self {
            Self::Progress(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Inspect `job`'s working directory and read its step counters.
///
/// Only running jobs with both marker files present are parsed. A run that
/// has not produced a sample yet is reported as
/// [`ProgressOutcome::AwaitingData`], not as an error.
pub fn extract_progress(
    job: &JobDescriptor,
    now: DateTime<Utc>,
) -> Result<ProgressOutcome, ProgressError> {
    if !job.state.is_running() {
        tracing::debug!(job_id = %job.id, state = %job.state, "job not running");
        return Ok(ProgressOutcome::NotRecognized);
    }

    let controls_path = job.working_dir.join(CONTROLS_FILE);
    let counters_path = job.working_dir.join(COUNTERS_FILE);
    if !controls_path.is_file() || !counters_path.is_file() {
        tracing::debug!(job_id = %job.id, dir = %job.working_dir, "no ReFRESCO marker files");
        return Ok(ProgressOutcome::NotRecognized);
    }

    let controls = Controls::load(&controls_path)?;

    match read_counters(&counters_path, controls.mode) {
        Ok(samples) => Ok(ProgressOutcome::Progress(ProgressSnapshot {
            mode: controls.mode,
            initial_step: samples.initial,
            current_step: samples.current,
            max_step: controls.max_step,
            sample_time: now,
        })),
        Err(ProgressError::MissingData(why)) => {
            tracing::debug!(job_id = %job.id, %why, "awaiting first sample");
            Ok(ProgressOutcome::AwaitingData {
                mode: controls.mode,
                max_step: controls.max_step,
            })
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use chrono::TimeZone;
    use rsqueue_slurm::JobState;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    pub(crate) fn job_in(dir: &TempDir, state: JobState) -> JobDescriptor {
        JobDescriptor {
            id: "101".to_string(),
            name: "propeller".to_string(),
            state,
            reason: None,
            submit_time: None,
            start_time: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            end_time: None,
            time_limit: Some(Duration::from_secs(24 * 3600)),
            num_cores: 32,
            working_dir: Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap(),
            stdout_path: None,
            stderr_path: None,
        }
    }

    fn controls_xml(unsteady: bool) -> String {
        format!(
            "<controls><outerLoop><maxIteration>100</maxIteration></outerLoop>\
             <timeLoop><unsteady>{unsteady}</unsteady><maxTimesteps>40</maxTimesteps></timeLoop></controls>"
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_steady_progress() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONTROLS_FILE), controls_xml(false)).unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), "#h\n#h\n0 1.0\n25 0.1\n50 0.01\n").unwrap();

        let outcome = extract_progress(&job_in(&dir, JobState::Running), now()).unwrap();
        assert!(outcome.is_recognized_engine());
        let snap = outcome.snapshot().unwrap();
        assert_eq!(snap.mode, SimulationMode::Steady);
        assert_eq!((snap.initial_step, snap.current_step, snap.max_step), (0, 50, 100));
        assert_eq!(snap.sample_time, now());
        assert_eq!(snap.steps_done(), 50);
    }

    #[test]
    fn test_unsteady_progress() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONTROLS_FILE), controls_xml(true)).unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), "#h\n#h\n1 3 1.0\n9 7 0.1\n").unwrap();

        let outcome = extract_progress(&job_in(&dir, JobState::Running), now()).unwrap();
        let snap = outcome.snapshot().unwrap();
        assert_eq!(snap.mode, SimulationMode::Unsteady);
        assert_eq!((snap.initial_step, snap.current_step, snap.max_step), (3, 7, 40));
    }

    #[test]
    fn test_missing_markers_skip_parsing() {
        let dir = TempDir::new().unwrap();
        // Garbage controls file: parsing it would fail.
        fs::write(dir.path().join(CONTROLS_FILE), "not xml at all <").unwrap();

        let outcome = extract_progress(&job_in(&dir, JobState::Running), now()).unwrap();
        assert_eq!(outcome, ProgressOutcome::NotRecognized);
        assert!(!outcome.is_recognized_engine());
        assert!(outcome.snapshot().is_none());
    }

    #[test]
    fn test_not_running_skips_parsing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONTROLS_FILE), "not xml at all <").unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), "junk").unwrap();

        for state in [JobState::Pending, JobState::Completed, JobState::Failed] {
            let outcome = extract_progress(&job_in(&dir, state), now()).unwrap();
            assert_eq!(outcome, ProgressOutcome::NotRecognized);
        }
    }

    #[test]
    fn test_awaiting_first_sample() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONTROLS_FILE), controls_xml(false)).unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), "#h\n#h\n").unwrap();

        let outcome = extract_progress(&job_in(&dir, JobState::Running), now()).unwrap();
        assert_eq!(
            outcome,
            ProgressOutcome::AwaitingData {
                mode: SimulationMode::Steady,
                max_step: 100
            }
        );
        assert!(outcome.is_recognized_engine());
    }

    #[test]
    fn test_config_errors_surface() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONTROLS_FILE),
            "<controls><timeLoop><unsteady>false</unsteady></timeLoop></controls>",
        )
        .unwrap();
        fs::write(dir.path().join(COUNTERS_FILE), "#h\n#h\n0 1.0\n").unwrap();

        assert!(matches!(
            extract_progress(&job_in(&dir, JobState::Running), now()),
            Err(ProgressError::ConfigPathMissing(_))
        ));
    }
}
