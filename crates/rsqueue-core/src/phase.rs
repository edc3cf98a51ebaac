//! Job phase classification.

use crate::progress::ProgressOutcome;
use rsqueue_slurm::JobState;
use serde::Serialize;

/// Where a job stands, combining scheduler state and simulation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Queued, suspended, or in a state we do not track.
    Unknown,
    /// Running, but not a ReFRESCO run.
    NotRecognized,
    /// ReFRESCO run without a first sample.
    AwaitingData,
    Progressing,
    Finished { success: bool },
}

impl JobPhase {
    /// Classify a job from its scheduler state and, for running jobs, the
    /// result of progress extraction.
    pub fn classify(state: &JobState, outcome: Option<&ProgressOutcome>) -> Self {
        if state.is_finished() {
            return Self::Finished {
                success: state.is_success(),
            };
        }
        if !state.is_running() {
            return Self::Unknown;
        }
        match outcome {
            None => Self::Unknown,
            Some(ProgressOutcome::NotRecognized) => Self::NotRecognized,
            Some(ProgressOutcome::AwaitingData { .. }) => Self::AwaitingData,
            Some(ProgressOutcome::Progress(_)) => Self::Progressing,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::NotRecognized => "not ReFRESCO",
            Self::AwaitingData => "waiting for first sample",
            Self::Progressing => "running",
            Self::Finished { success: true } => "completed",
            Self::Finished { success: false } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::SimulationMode;
    use crate::progress::ProgressSnapshot;
    use chrono::Utc;

    #[test]
    fn test_classify_running() {
        let awaiting = ProgressOutcome::AwaitingData {
            mode: SimulationMode::Unsteady,
            max_step: 10,
        };
        let progress = ProgressOutcome::Progress(ProgressSnapshot {
            mode: SimulationMode::Unsteady,
            initial_step: 0,
            current_step: 1,
            max_step: 10,
            sample_time: Utc::now(),
        });

        let running = JobState::Running;
        assert_eq!(JobPhase::classify(&running, None), JobPhase::Unknown);
        assert_eq!(
            JobPhase::classify(&running, Some(&ProgressOutcome::NotRecognized)),
            JobPhase::NotRecognized
        );
        assert_eq!(
            JobPhase::classify(&running, Some(&awaiting)),
            JobPhase::AwaitingData
        );
        assert_eq!(
            JobPhase::classify(&running, Some(&progress)),
            JobPhase::Progressing
        );
    }

    #[test]
    fn test_classify_scheduler_states() {
        assert_eq!(
            JobPhase::classify(&JobState::Pending, None),
            JobPhase::Unknown
        );
        assert_eq!(
            JobPhase::classify(&JobState::Completed, Some(&ProgressOutcome::NotRecognized)),
            JobPhase::Finished { success: true }
        );
        assert_eq!(
            JobPhase::classify(&JobState::Timeout, None),
            JobPhase::Finished { success: false }
        );
        assert_eq!(JobPhase::Finished { success: false }.label(), "failed");
    }
}
