//! CLI argument parsing for rsqueue.

use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "rsqueue")]
#[command(about = "Show progress and ETA of ReFRESCO jobs running on SLURM")]
pub struct Args {
    /// SLURM job IDs to inspect
    #[arg(required = true, value_name = "JOB_ID")]
    pub job_ids: Vec<String>,

    /// Timeout in seconds for each scontrol/du call
    #[arg(long, default_value = "10")]
    pub timeout: u64,

    /// Skip measuring the working directory size
    #[arg(long)]
    pub no_storage: bool,

    /// Print one JSON document per job
    #[arg(long)]
    pub json: bool,

    /// Poll again every N seconds instead of exiting
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
