//! Plain-text rendering of a job report.

use crate::polling::JobReport;
use rsqueue_core::{EtaProjection, ProgressOutcome, SimulationMode};
use rsqueue_parsers::{format_date, format_duration, format_duration_slurm, to_human};
use std::fmt::Write;

const UNAVAILABLE: &str = "n/a";

fn mode_label(mode: SimulationMode) -> &'static str {
    match mode {
        SimulationMode::Steady => "steady (iterations)",
        SimulationMode::Unsteady => "unsteady (timesteps)",
    }
}

/// Render a report as an indented block of `key: value` lines.
pub fn render_text(report: &JobReport) -> String {
    let job = &report.job;
    let mut out = String::new();

    let _ = writeln!(out, "{} {} [{}]", job.id, job.name, job.state);
    let _ = writeln!(out, "  phase:       {}", report.phase.label());
    if let Some(reason) = &job.reason {
        let _ = writeln!(out, "  reason:      {}", reason);
    }
    let _ = writeln!(out, "  directory:   {}", job.working_dir);
    let _ = writeln!(out, "  cores:       {}", job.num_cores);
    let _ = writeln!(
        out,
        "  time limit:  {}",
        job.time_limit
            .map(|d| format_duration_slurm(d.as_secs()))
            .unwrap_or_else(|| "UNLIMITED".to_string())
    );
    if let Some(start) = &job.start_time {
        let _ = writeln!(out, "  started:     {}", format_date(start));
    }

    match &report.progress {
        Some(ProgressOutcome::AwaitingData { mode, max_step }) => {
            let _ = writeln!(out, "  mode:        {}", mode_label(*mode));
            let _ = writeln!(out, "  step:        -/{}", max_step);
        }
        Some(ProgressOutcome::Progress(snapshot)) => {
            let _ = writeln!(out, "  mode:        {}", mode_label(snapshot.mode));
            let _ = writeln!(
                out,
                "  step:        {}/{} (from {})",
                snapshot.current_step, snapshot.max_step, snapshot.initial_step
            );
        }
        _ => {}
    }

    if let Some(projection) = &report.projection {
        render_projection(&mut out, projection);
    }

    out
}

fn render_projection(out: &mut String, p: &EtaProjection) {
    let or_na = |v: Option<String>| v.unwrap_or_else(|| UNAVAILABLE.to_string());

    if let Some(elapsed) = p.elapsed {
        let _ = writeln!(out, "  elapsed:     {}", format_duration(elapsed.as_secs()));
    }
    let _ = writeln!(
        out,
        "  progress:    {}",
        or_na(p.fraction_complete.map(|f| format!("{:.1}%", f * 100.0)))
    );
    let _ = writeln!(out, "  ETA:         {}", or_na(p.eta.as_ref().map(format_date)));
    let _ = writeln!(
        out,
        "  remaining:   {}",
        or_na(p.time_remaining.map(|d| format_duration(d.as_secs())))
    );
    let _ = writeln!(
        out,
        "  reachable:   {}",
        or_na(p.max_feasible_step.map(|s| format!("step {} within time limit", s)))
    );
    if p.exceeds_time_limit == Some(true) {
        let _ = writeln!(out, "  warning:     run will hit the time limit before finishing");
    }
    let _ = writeln!(
        out,
        "  core-hours:  {}",
        or_na(p.eta_core_hours.map(|h| format!("{:.1}", h)))
    );
    if let Some(size) = p.current_directory_size {
        let _ = writeln!(
            out,
            "  storage:     {} -> {}",
            to_human(size),
            or_na(p.eta_directory_size.map(to_human))
        );
    }
}
