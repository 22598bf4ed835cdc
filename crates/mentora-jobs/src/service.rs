//! The report service: the operations the HTTP gateway exposes, with all
//! access control decided here so every transport shares one policy.
//!
//! Generation and listing are admin operations; reads of a single report are
//! owner-or-super-admin. Non-super-admins only ever see their own records,
//! in listings and in direct lookups alike.

use std::path::PathBuf;

use jiff::Timestamp;
use tracing::info;
use uuid::Uuid;

use mentora_core::analytics::AnalyticsSource;
use mentora_core::models::report::{
    ProgressView, Report, ReportFormat, ReportParameters, ReportStatus, ReportType,
};
use mentora_core::models::requester::{Requester, Role};
use mentora_store::reports::{NewReport, ReportFilter};

use crate::error::JobError;
use crate::progress::progress_view;
use crate::queue::JobQueue;
use crate::JobContext;

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub parameters: ReportParameters,
}

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub skip: usize,
    /// Page size; zero means the default of 100.
    pub limit: usize,
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone)]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

pub struct ReportService<A> {
    ctx: JobContext<A>,
    queue: JobQueue,
}

impl<A> ReportService<A>
where
    A: AnalyticsSource + 'static,
{
    pub fn new(ctx: JobContext<A>, queue: JobQueue) -> Self {
        ReportService { ctx, queue }
    }

    pub fn context(&self) -> &JobContext<A> {
        &self.ctx
    }

    /// Validate, persist a pending record, and enqueue it. Invalid parameters
    /// never create a record.
    pub async fn generate(
        &self,
        request: GenerateRequest,
        requester: &Requester,
    ) -> Result<Report, JobError> {
        if !requester.role.can_manage_reports() {
            return Err(JobError::Forbidden);
        }
        request.parameters.validate(request.report_type)?;

        let report = self
            .ctx
            .store
            .create(NewReport {
                report_type: request.report_type,
                title: request.report_type.default_title(Timestamp::now()),
                format: request.format,
                parameters: request.parameters,
                created_by: requester.id,
            })
            .await?;
        self.queue.submit(report.id)?;
        info!(report_id = %report.id, requester = %requester.id, "report accepted");
        Ok(report)
    }

    pub async fn get(&self, id: Uuid, requester: &Requester) -> Result<Report, JobError> {
        let report = self.ctx.store.load(id).await?;
        if !requester.can_view(&report) {
            return Err(JobError::Forbidden);
        }
        Ok(report)
    }

    /// List visible reports, newest first, with skip/limit pagination.
    pub async fn list(
        &self,
        query: ListQuery,
        requester: &Requester,
    ) -> Result<ReportPage, JobError> {
        if !requester.role.can_manage_reports() {
            return Err(JobError::Forbidden);
        }
        let created_by = if requester.role == Role::SuperAdmin {
            None
        } else {
            Some(requester.id)
        };

        let all = self
            .ctx
            .store
            .list(ReportFilter {
                created_by,
                report_type: query.report_type,
                status: query.status,
            })
            .await?;

        let total = all.len();
        let limit = if query.limit == 0 { 100 } else { query.limit };
        let reports = all.into_iter().skip(query.skip).take(limit).collect();
        Ok(ReportPage {
            reports,
            total,
            skip: query.skip,
            limit,
        })
    }

    pub async fn progress(&self, id: Uuid, requester: &Requester) -> Result<ProgressView, JobError> {
        let report = self.get(id, requester).await?;
        Ok(progress_view(&report, &self.ctx.progress))
    }

    /// Resolve the artifact for download. Only completed reports with a
    /// still-present file qualify; an expired artifact reads as not found.
    pub async fn download(
        &self,
        id: Uuid,
        requester: &Requester,
    ) -> Result<(Report, PathBuf), JobError> {
        let report = self.get(id, requester).await?;
        if report.status != ReportStatus::Completed {
            return Err(JobError::NotReady {
                status: report.status,
            });
        }
        let path = match &report.file_path {
            Some(path) => PathBuf::from(path),
            None => return Err(JobError::NotFound { id }),
        };
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(JobError::NotFound { id });
        }
        Ok((report, path))
    }
}
