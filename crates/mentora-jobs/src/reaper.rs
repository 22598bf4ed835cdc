//! Reconciliation sweeps over the record store.
//!
//! Two periodic tasks: the stalled sweep fails `processing` records whose
//! worker evidently died (crash, hard-deadline abort), and the retention
//! sweep deletes expired artifacts of completed reports and clears their
//! file pointers. Both are idempotent and safe to run at any cadence.

use std::time::Duration;

use jiff::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use mentora_core::models::report::ReportStatus;
use mentora_store::error::StoreError;
use mentora_store::reports::{ReportFilter, ReportStore, Transition};

/// Outcome of one stalled-job sweep.
#[derive(Debug, Default)]
pub struct StalledSweep {
    pub failed: Vec<Uuid>,
    pub still_running: usize,
}

/// Outcome of one retention sweep.
#[derive(Debug, Default)]
pub struct RetentionSweep {
    pub expired: Vec<Uuid>,
    pub kept: usize,
}

fn age(now: Timestamp, since: Timestamp) -> Duration {
    let millis = now.as_millisecond().saturating_sub(since.as_millisecond());
    Duration::from_millis(millis.max(0) as u64)
}

/// Fail `processing` records whose run started more than `stalled_after`
/// ago. A record that old can only mean the worker never got to apply its
/// terminal transition.
pub async fn sweep_stalled(
    store: &ReportStore,
    stalled_after: Duration,
    now: Timestamp,
) -> Result<StalledSweep, StoreError> {
    let processing = store
        .list(ReportFilter {
            status: Some(ReportStatus::Processing),
            ..Default::default()
        })
        .await?;

    let mut sweep = StalledSweep::default();
    for report in processing {
        let since = report.started_at.unwrap_or(report.created_at);
        if age(now, since) > stalled_after {
            store
                .transition(
                    report.id,
                    Transition::Fail {
                        error_message: "report worker did not complete".to_string(),
                    },
                )
                .await?;
            warn!(report_id = %report.id, "stalled report marked failed");
            sweep.failed.push(report.id);
        } else {
            sweep.still_running += 1;
        }
    }
    Ok(sweep)
}

/// Delete artifacts of completed reports older than `retention` and clear
/// their file pointers. The record itself stays, completed, for history.
pub async fn sweep_expired(
    store: &ReportStore,
    retention: Duration,
    now: Timestamp,
) -> Result<RetentionSweep, StoreError> {
    let completed = store
        .list(ReportFilter {
            status: Some(ReportStatus::Completed),
            ..Default::default()
        })
        .await?;

    let mut sweep = RetentionSweep::default();
    for report in completed {
        let Some(path) = &report.file_path else {
            continue;
        };
        if age(now, report.created_at) <= retention {
            sweep.kept += 1;
            continue;
        }

        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(report_id = %report.id, error = %e, "could not delete expired artifact");
                continue;
            }
        }
        store.clear_artifact(report.id).await?;
        info!(report_id = %report.id, "expired report artifact deleted");
        sweep.expired.push(report.id);
    }
    Ok(sweep)
}
