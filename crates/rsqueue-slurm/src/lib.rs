//! SLURM integration for rsqueue.
//!
//! Query a single job's description via `scontrol show job`.

pub mod scontrol;
pub mod types;

pub use scontrol::{Scontrol, SchedulerError, SchedulerQuery, fetch, parse_job_record};
pub use types::{JobDescriptor, JobState};
