//! Background tool runtime.
//!
//! Each queued [`Job`] runs on its own tokio task; the result comes back to
//! the UI loop as a [`JobUpdate`] over an unbounded channel.  There is no
//! pool, no cancellation and no retry.

use std::path::PathBuf;

use tokio::sync::mpsc::UnboundedSender;

use crate::app::state::{AppState, LogTarget};
use crate::core::tool::{ToolCommand, ToolError, ToolOutput, ToolRunner};

/// What to do in the UI once a job succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    None,
    /// Reload the form from this INI file.
    ReloadIni(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: u64,
    pub command: ToolCommand,
    pub target: LogTarget,
    pub then: FollowUp,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub job: Job,
    pub result: Result<ToolOutput, ToolError>,
}

/// Spawn every queued job.
pub fn drain_queue(state: &mut AppState, runner: &ToolRunner, tx: &UnboundedSender<JobUpdate>) {
    for job in std::mem::take(&mut state.job_queue) {
        state.running_jobs += 1;
        spawn_job(runner, tx, job);
    }
}

pub fn spawn_job(runner: &ToolRunner, tx: &UnboundedSender<JobUpdate>, job: Job) {
    let runner = runner.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = runner.run(&job.command).await;
        // Receiver gone means the UI is shutting down.
        let _ = tx.send(JobUpdate { job, result });
    });
}

/// Report a finished job in its panel and run its follow-up.
pub fn apply_job_update(state: &mut AppState, update: JobUpdate) {
    state.running_jobs = state.running_jobs.saturating_sub(1);
    let JobUpdate { job, result } = update;
    let target = job.target;

    match result {
        Ok(output) => {
            log_output(state, target, &output);
            if let FollowUp::ReloadIni(path) = &job.then {
                state.load_ini(path);
            }
        }
        Err(ToolError::Failed { output, .. }) => {
            log_output(state, target, &output);
            state.log(target, &format!("Error: {} failed", job.command));
        }
        Err(ToolError::Timeout(after)) => {
            state.log(target, &format!("Command timed out after {after:?}"));
        }
        Err(e) => {
            state.log(target, &format!("Error: {e}"));
        }
    }
    tracing::debug!("job {} ({}) finished", job.id, job.command);
}

fn log_output(state: &mut AppState, target: LogTarget, output: &ToolOutput) {
    if !output.stdout.trim().is_empty() {
        state.log(target, &format!("STDOUT:\n{}", output.stdout));
    }
    if !output.stderr.trim().is_empty() {
        state.log(target, &format!("STDERR:\n{}", output.stderr));
    }
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "terminated by signal".into());
    state.log(target, &format!("Exit code: {code}"));
}
