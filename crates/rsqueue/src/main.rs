//! rsqueue - progress and ETA of ReFRESCO jobs on SLURM.

mod polling;
mod report;

use chrono::Utc;
use clap::Parser;
use miette::{IntoDiagnostic, Result, miette};
use polling::{PollConfig, poll_job};
use rsqueue_cli::Args;
use rsqueue_core::Du;
use rsqueue_slurm::Scontrol;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "RSQUEUE_LOG";

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let scheduler = Scontrol {
        timeout: args.command_timeout(),
    };
    let disk = Du {
        timeout: args.command_timeout(),
    };
    let config = PollConfig {
        measure_storage: !args.no_storage,
    };

    loop {
        let failed = poll_all(&args, &scheduler, &disk, &config).await?;

        match args.watch {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs.max(1))).await,
            None if failed > 0 => {
                return Err(miette!(
                    "{} of {} job(s) could not be inspected",
                    failed,
                    args.job_ids.len()
                ));
            }
            None => return Ok(()),
        }
    }
}

/// Poll every requested job once and print the results.
///
/// Returns the number of jobs that could not be polled.
async fn poll_all(
    args: &Args,
    scheduler: &Scontrol,
    disk: &Du,
    config: &PollConfig,
) -> Result<usize> {
    let mut failed = 0;

    for job_id in &args.job_ids {
        match poll_job(scheduler, disk, config, job_id, Utc::now()).await {
            Ok(report) if args.json => {
                println!("{}", serde_json::to_string(&report).into_diagnostic()?);
            }
            Ok(report) => println!("{}", report::render_text(&report)),
            Err(e) => {
                tracing::error!(job_id = %job_id, "poll failed: {}", e);
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    Ok(failed)
}
