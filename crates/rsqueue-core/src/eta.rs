//! Completion time and disk usage projection.
//!
//! Every estimate comes from one linear extrapolation: the wall time per
//! step observed between the job start and the latest sample is assumed to
//! hold for the rest of the run. No smoothing is applied across polls, so
//! early estimates swing with start-up cost (mesh loading, first-iteration
//! overhead) and settle as the run goes on.

use crate::progress::ProgressSnapshot;
use chrono::{DateTime, TimeDelta, Utc};
use rsqueue_slurm::JobDescriptor;
use serde::Serialize;
use std::time::Duration;

/// Why the derived fields of a projection are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// The scheduler has no start time for the job.
    NotStarted,
    /// No step has completed since the first sample.
    NoProgress,
    /// The step limit equals the first sampled step.
    NothingToDo,
}

/// Projected end of a run.
///
/// Everything except `elapsed` and `current_directory_size` is `None` when
/// `unavailable` is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EtaProjection {
    pub unavailable: Option<Unavailable>,
    /// Wall time from job start to the sample.
    pub elapsed: Option<Duration>,
    /// Share of the steps between first sample and limit that are done.
    pub fraction_complete: Option<f64>,
    pub eta: Option<DateTime<Utc>>,
    pub time_remaining: Option<Duration>,
    /// Step reached when the scheduler time limit runs out. Not clamped to
    /// the step limit.
    pub max_feasible_step: Option<u64>,
    /// Whether the ETA falls after the time limit deadline.
    pub exceeds_time_limit: Option<bool>,
    /// Core-hours the whole run will have used at the ETA.
    pub eta_core_hours: Option<f64>,
    pub current_directory_size: Option<u64>,
    pub eta_directory_size: Option<u64>,
}

/// Project the completion of `job` from `snapshot`.
///
/// `directory_size` is the current size of the working directory in bytes,
/// when it was measured. The sample time of the snapshot is taken as "now".
pub fn project(
    snapshot: &ProgressSnapshot,
    job: &JobDescriptor,
    directory_size: Option<u64>,
) -> EtaProjection {
    let now = snapshot.sample_time;
    let mut projection = EtaProjection {
        current_directory_size: directory_size,
        elapsed: job.elapsed(now),
        ..Default::default()
    };

    let Some(start) = job.start_time else {
        projection.unavailable = Some(Unavailable::NotStarted);
        return projection;
    };
    if !snapshot.has_progress() {
        projection.unavailable = Some(Unavailable::NoProgress);
        return projection;
    }
    if snapshot.max_step == snapshot.initial_step {
        projection.unavailable = Some(Unavailable::NothingToDo);
        return projection;
    }

    let done = snapshot.steps_done();
    let span = snapshot.max_step.saturating_sub(snapshot.initial_step);
    let remaining_steps = snapshot.max_step.saturating_sub(snapshot.current_step);
    let elapsed_secs = (now - start).num_milliseconds().max(0) as f64 / 1000.0;

    let secs_per_step = elapsed_secs / done as f64;
    let remaining_secs = remaining_steps as f64 * secs_per_step;
    let eta = TimeDelta::try_milliseconds((remaining_secs * 1000.0).round() as i64)
        .and_then(|delta| now.checked_add_signed(delta));

    projection.fraction_complete = Some((done as f64 / span as f64).min(1.0));
    projection.eta = eta;
    projection.time_remaining = eta.and_then(|eta| (eta - now).to_std().ok());
    projection.eta_core_hours =
        Some(job.num_cores as f64 * (elapsed_secs + remaining_secs) / 3600.0);

    if let Some(limit) = job.time_limit {
        if elapsed_secs > 0.0 {
            let reachable = done as f64 * limit.as_secs_f64() / elapsed_secs;
            projection.max_feasible_step =
                Some(snapshot.initial_step.saturating_add(reachable.floor() as u64));
        }
        let deadline = TimeDelta::from_std(limit)
            .ok()
            .and_then(|limit| start.checked_add_signed(limit));
        projection.exceeds_time_limit = deadline.zip(eta).map(|(deadline, eta)| eta > deadline);
    }

    projection.eta_directory_size = directory_size.map(|size| {
        let growth = remaining_steps as u128 * size as u128 / done as u128;
        u64::try_from(size as u128 + growth).unwrap_or(u64::MAX)
    });

    projection
}
