//! The report record store: single source of truth for report lifecycle
//! state across the gateway, the job runner, and the progress tracker.
//!
//! Records live as pretty-printed JSON under `<data_dir>/records/`, written
//! atomically (temp file + rename). The store owns its directory, so
//! transitions are serialized with an in-process mutex over the
//! read-validate-write cycle; an attempt that loses the race fails the
//! state-machine check cleanly instead of corrupting the record.

use std::path::{Path, PathBuf};

use jiff::Timestamp;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use mentora_core::models::report::{
    Report, ReportFormat, ReportParameters, ReportStatus, ReportType,
};
use mentora_core::report_files;

use crate::error::StoreError;

/// Fields the gateway supplies when accepting a request.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_type: ReportType,
    pub title: String,
    pub format: ReportFormat,
    pub parameters: ReportParameters,
    pub created_by: Uuid,
}

/// A status change plus the fields that accompany it. The store derives the
/// target status and rejects anything the state machine forbids.
#[derive(Debug, Clone)]
pub enum Transition {
    /// pending → processing.
    Start,
    /// processing → completed.
    Complete { file_path: String, file_size: u64 },
    /// processing → failed.
    Fail { error_message: String },
}

impl Transition {
    fn target(&self) -> ReportStatus {
        match self {
            Transition::Start => ReportStatus::Processing,
            Transition::Complete { .. } => ReportStatus::Completed,
            Transition::Fail { .. } => ReportStatus::Failed,
        }
    }
}

/// Optional list filters, combined with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFilter {
    pub created_by: Option<Uuid>,
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    fn matches(&self, report: &Report) -> bool {
        if let Some(owner) = self.created_by
            && report.created_by != owner
        {
            return false;
        }
        if let Some(ty) = self.report_type
            && report.report_type != ty
        {
            return false;
        }
        if let Some(status) = self.status
            && report.status != status
        {
            return false;
        }
        true
    }
}

pub struct ReportStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ReportStore {
    /// Open a store rooted at `data_dir`, creating the records directory.
    pub async fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(data_dir.join(report_files::RECORDS_DIR)).await?;
        Ok(ReportStore {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create a new pending record.
    pub async fn create(&self, new: NewReport) -> Result<Report, StoreError> {
        let report = Report {
            id: Uuid::new_v4(),
            report_type: new.report_type,
            title: new.title,
            format: new.format,
            status: ReportStatus::Pending,
            parameters: new.parameters,
            file_path: None,
            file_size: None,
            error_message: None,
            created_by: new.created_by,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
        };

        let _guard = self.write_lock.lock().await;
        self.write(&report).await?;
        info!(report_id = %report.id, report_type = %report.report_type, "report record created");
        Ok(report)
    }

    pub async fn load(&self, id: Uuid) -> Result<Report, StoreError> {
        let path = report_files::record_path(&self.data_dir, id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// All records matching `filter`, newest first.
    pub async fn list(&self, filter: ReportFilter) -> Result<Vec<Report>, StoreError> {
        let records_dir = self.data_dir.join(report_files::RECORDS_DIR);
        let mut entries = tokio::fs::read_dir(&records_dir).await?;
        let mut reports = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = tokio::fs::read(&path).await?;
            let report: Report = serde_json::from_slice(&bytes)?;
            if filter.matches(&report) {
                reports.push(report);
            }
        }

        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Atomically apply a status change and its associated fields. Rejects
    /// any transition the monotonic ordering forbids; terminal records are
    /// never modified again.
    pub async fn transition(&self, id: Uuid, transition: Transition) -> Result<Report, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut report = self.load(id).await?;
        let target = transition.target();
        if !report.status.can_transition_to(target) {
            return Err(StoreError::InvalidTransition {
                id,
                from: report.status,
                to: target,
            });
        }

        let now = Timestamp::now();
        match transition {
            Transition::Start => {
                report.status = ReportStatus::Processing;
                report.started_at = Some(now);
            }
            Transition::Complete {
                file_path,
                file_size,
            } => {
                report.status = ReportStatus::Completed;
                report.file_path = Some(file_path);
                report.file_size = Some(file_size);
                report.completed_at = Some(now);
            }
            Transition::Fail { error_message } => {
                report.status = ReportStatus::Failed;
                report.error_message = Some(error_message);
                report.completed_at = Some(now);
            }
        }

        self.write(&report).await?;
        info!(report_id = %id, status = %report.status, "report record transitioned");
        Ok(report)
    }

    /// Drop the artifact pointer of an expired completed report. Used by the
    /// retention sweep after the file itself has been deleted; not a status
    /// transition.
    pub async fn clear_artifact(&self, id: Uuid) -> Result<Report, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut report = self.load(id).await?;
        if report.status != ReportStatus::Completed {
            return Err(StoreError::NotExpirable {
                id,
                status: report.status,
            });
        }

        report.file_path = None;
        report.file_size = None;
        self.write(&report).await?;
        Ok(report)
    }

    async fn write(&self, report: &Report) -> Result<(), StoreError> {
        let path = report_files::record_path(&self.data_dir, report.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
