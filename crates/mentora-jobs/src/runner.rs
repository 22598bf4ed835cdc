//! The job runner: executes one report generation end to end and applies
//! exactly one terminal transition to the record.
//!
//! A run claims the record (pending → processing), then executes the
//! collect/render/verify phases on a spawned task so the runner can enforce
//! deadlines from outside. Any phase error is converted into a `failed`
//! record with the error message, never a lost job. Only a hard-deadline
//! abort leaves the record `processing`; the stalled sweep resolves those.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use jiff::Timestamp;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use mentora_core::analytics::AnalyticsSource;
use mentora_core::dataset::DataSet;
use mentora_core::models::report::{Report, ReportStatus};
use mentora_core::report_files;
use mentora_export::Renderer;
use mentora_store::reports::Transition;

use crate::error::JobError;
use crate::{JobContext, RunnerConfig};

#[derive(Debug, thiserror::Error)]
enum PhaseError {
    #[error(transparent)]
    Collect(#[from] mentora_collect::error::CollectError),
    #[error(transparent)]
    Render(#[from] mentora_export::error::ExportError),
    #[error("cancelled: generation exceeded the soft deadline")]
    Cancelled,
    #[error("render worker panicked")]
    RenderPanicked,
    #[error("generated file is missing or empty: {0}")]
    BadOutput(String),
    #[error("io error during generation: {0}")]
    Io(#[from] std::io::Error),
}

enum Outcome {
    Finished(Result<(PathBuf, u64), PhaseError>),
    Panicked,
    HardDeadline,
}

/// Run the report identified by `id` to a terminal state.
///
/// Returns the record as left in the store, or an error when no run happened
/// at all (unknown id, record already claimed, hard-deadline abort).
pub async fn run_job<A>(ctx: &JobContext<A>, id: Uuid) -> Result<Report, JobError>
where
    A: AnalyticsSource + 'static,
{
    let report = ctx.store.load(id).await?;
    if report.status != ReportStatus::Pending {
        return Err(JobError::AlreadyStarted {
            id,
            status: report.status,
        });
    }

    let report = ctx.store.transition(id, Transition::Start).await?;
    ctx.progress.update(id, 10, "preparing");

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let phases = tokio::spawn(execute(ctx.clone(), report, cancel_rx));
    let outcome = await_with_deadlines(phases, cancel_tx, ctx.config).await;

    match outcome {
        Outcome::Finished(Ok((path, size))) => {
            let report = ctx
                .store
                .transition(
                    id,
                    Transition::Complete {
                        file_path: path.display().to_string(),
                        file_size: size,
                    },
                )
                .await?;
            ctx.progress.update(id, 100, "completed");
            ctx.progress.clear(id);
            info!(report_id = %id, file_size = size, "report generated");
            Ok(report)
        }
        Outcome::Finished(Err(phase_err)) => {
            let report = ctx
                .store
                .transition(
                    id,
                    Transition::Fail {
                        error_message: phase_err.to_string(),
                    },
                )
                .await?;
            ctx.progress.clear(id);
            warn!(report_id = %id, error = %phase_err, "report generation failed");
            Ok(report)
        }
        Outcome::Panicked => {
            let report = ctx
                .store
                .transition(
                    id,
                    Transition::Fail {
                        error_message: "report job panicked".to_string(),
                    },
                )
                .await?;
            ctx.progress.clear(id);
            warn!(report_id = %id, "report job panicked");
            Ok(report)
        }
        Outcome::HardDeadline => {
            ctx.progress.clear(id);
            warn!(report_id = %id, "report job aborted at the hard deadline");
            Err(JobError::HardDeadline)
        }
    }
}

/// The generation phases, with checkpoints published between them and a
/// cooperative cancellation check before each one.
async fn execute<A>(
    ctx: JobContext<A>,
    report: Report,
    cancel: watch::Receiver<bool>,
) -> Result<(PathBuf, u64), PhaseError>
where
    A: AnalyticsSource + 'static,
{
    let id = report.id;

    check_cancel(&cancel)?;
    ctx.progress.update(id, 30, "collecting data");
    let data = mentora_collect::collect(&*ctx.analytics, report.report_type, &report.parameters)
        .await?;

    check_cancel(&cancel)?;
    ctx.progress.update(id, 60, "rendering report");
    let renderer = ctx.registry.renderer(report.report_type, report.format)?;
    let generated_at = Timestamp::now();
    let out = report_files::output_path(ctx.store.data_dir(), id, generated_at, report.format);
    if let Some(parent) = out.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    match render_and_verify(&ctx, report, generated_at, data, renderer, &out, &cancel).await {
        Ok(size) => Ok((out, size)),
        Err(e) => {
            // A failed run must not leave partial output behind; the record
            // store is the only index over the outputs directory.
            let _ = tokio::fs::remove_file(&out).await;
            Err(e)
        }
    }
}

async fn render_and_verify<A>(
    ctx: &JobContext<A>,
    report: Report,
    generated_at: Timestamp,
    data: DataSet,
    renderer: Arc<dyn Renderer>,
    out: &Path,
    cancel: &watch::Receiver<bool>,
) -> Result<u64, PhaseError>
where
    A: AnalyticsSource + 'static,
{
    let id = report.id;

    // Both the PDF and workbook builders are CPU-bound and synchronous.
    let render_out = out.to_path_buf();
    let render = tokio::task::spawn_blocking(move || {
        renderer.render(&report, generated_at, &data, &render_out)
    });
    match render.await {
        Ok(result) => result?,
        Err(_join) => return Err(PhaseError::RenderPanicked),
    }

    check_cancel(cancel)?;
    ctx.progress.update(id, 90, "finalizing");
    let meta = tokio::fs::metadata(out)
        .await
        .map_err(|_| PhaseError::BadOutput(out.display().to_string()))?;
    if meta.len() == 0 {
        return Err(PhaseError::BadOutput(out.display().to_string()));
    }

    Ok(meta.len())
}

fn check_cancel(cancel: &watch::Receiver<bool>) -> Result<(), PhaseError> {
    if *cancel.borrow() {
        Err(PhaseError::Cancelled)
    } else {
        Ok(())
    }
}

/// Wait for the phases with two nested deadlines. At the soft deadline the
/// cancellation flag is raised and the task gets the remaining time to
/// observe it; at the hard deadline the task is aborted.
async fn await_with_deadlines(
    mut phases: JoinHandle<Result<(PathBuf, u64), PhaseError>>,
    cancel_tx: watch::Sender<bool>,
    config: RunnerConfig,
) -> Outcome {
    match timeout(config.soft_deadline, &mut phases).await {
        Ok(joined) => finish(joined),
        Err(_) => {
            warn!("soft deadline elapsed, requesting cancellation");
            let _ = cancel_tx.send(true);
            let grace = config.hard_deadline.saturating_sub(config.soft_deadline);
            match timeout(grace, &mut phases).await {
                Ok(joined) => finish(joined),
                Err(_) => {
                    phases.abort();
                    Outcome::HardDeadline
                }
            }
        }
    }
}

fn finish(joined: Result<Result<(PathBuf, u64), PhaseError>, JoinError>) -> Outcome {
    match joined {
        Ok(result) => Outcome::Finished(result),
        Err(_) => Outcome::Panicked,
    }
}
