//! ReFRESCO progress extraction and ETA projection for rsqueue.
//!
//! Reads a job's `controls.xml` and counters file to find how far the run
//! has come, then extrapolates completion time and disk usage.

pub mod controls;
pub mod counters;
pub mod disk;
pub mod eta;
pub mod phase;
pub mod progress;

pub use controls::{Controls, SimulationMode};
pub use counters::{CounterSamples, read_counters};
pub use disk::{DirectorySize, DiskError, Du};
pub use eta::{EtaProjection, Unavailable, project};
pub use phase::JobPhase;
pub use progress::{
    CONTROLS_FILE, COUNTERS_FILE, ProgressError, ProgressOutcome, ProgressSnapshot,
    extract_progress,
};
