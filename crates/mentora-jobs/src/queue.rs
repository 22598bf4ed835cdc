//! The in-process job queue and worker pool.
//!
//! Accepted report ids go onto an unbounded channel; a dispatcher task hands
//! them to the runner behind a concurrency-limiting semaphore. Runner errors
//! are logged, never propagated: the record itself carries the outcome.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use mentora_core::analytics::AnalyticsSource;

use crate::error::JobError;
use crate::runner::run_job;
use crate::JobContext;

#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Uuid>,
}

impl JobQueue {
    /// Enqueue a pending report for generation.
    pub fn submit(&self, id: Uuid) -> Result<(), JobError> {
        self.tx.send(id).map_err(|_| JobError::QueueClosed)
    }
}

/// Start the dispatcher and return the queue handle. At most `workers` jobs
/// run concurrently; the dispatcher exits when every queue handle is dropped.
pub fn start_workers<A>(ctx: JobContext<A>, workers: usize) -> (JobQueue, JoinHandle<()>)
where
    A: AnalyticsSource + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = tokio::spawn(async move {
        let permits = Arc::new(Semaphore::new(workers.max(1)));
        while let Some(id) = rx.recv().await {
            let permit = match Arc::clone(&permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let _permit = permit;
                match run_job(&ctx, id).await {
                    Ok(report) => {
                        info!(report_id = %id, status = %report.status, "report job finished");
                    }
                    Err(e) => {
                        warn!(report_id = %id, error = %e, "report job did not complete");
                    }
                }
            });
        }
        info!("report queue closed, dispatcher exiting");
    });

    (JobQueue { tx }, dispatcher)
}
