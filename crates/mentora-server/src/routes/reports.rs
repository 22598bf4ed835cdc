use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::header;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mentora_core::models::report::{
    ProgressView, Report, ReportFormat, ReportParameters, ReportStatus, ReportType,
};
use mentora_core::models::requester::Requester;
use mentora_jobs::service::{GenerateRequest, ListQuery};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct GenerateBody {
    pub report_type: ReportType,
    pub format: ReportFormat,
    #[serde(default)]
    pub parameters: ReportParameters,
}

/// A report record as returned to clients: the record itself plus the
/// download URL once a completed artifact exists.
#[derive(Serialize)]
pub struct ReportBody {
    #[serde(flatten)]
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<Report> for ReportBody {
    fn from(report: Report) -> Self {
        let download_url = (report.status == ReportStatus::Completed
            && report.file_path.is_some())
        .then(|| format!("/reports/{}/download", report.id));
        ReportBody {
            report,
            download_url,
        }
    }
}

pub async fn generate_report(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<ReportBody>, ApiError> {
    let report = state
        .service
        .generate(
            GenerateRequest {
                report_type: body.report_type,
                format: body.format,
                parameters: body.parameters,
            },
            &requester,
        )
        .await?;
    Ok(Json(report.into()))
}

#[derive(Deserialize)]
pub struct ListParams {
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
}

#[derive(Serialize)]
pub struct ReportPageBody {
    pub reports: Vec<ReportBody>,
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

pub async fn list_reports(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Query(params): Query<ListParams>,
) -> Result<Json<ReportPageBody>, ApiError> {
    let page = state
        .service
        .list(
            ListQuery {
                skip: params.skip.unwrap_or(0),
                limit: params.limit.unwrap_or(0),
                report_type: params.report_type,
                status: params.status,
            },
            &requester,
        )
        .await?;
    Ok(Json(ReportPageBody {
        reports: page.reports.into_iter().map(ReportBody::from).collect(),
        total: page.total,
        skip: page.skip,
        limit: page.limit,
    }))
}

pub async fn get_report(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReportBody>, ApiError> {
    let report = state.service.get(id, &requester).await?;
    Ok(Json(report.into()))
}

pub async fn get_progress(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressView>, ApiError> {
    let view = state.service.progress(id, &requester).await?;
    Ok(Json(view))
}

/// Stream the finished artifact with its format's content type.
pub async fn download_report(
    State(state): State<AppState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (report, path) = state.service.download(id, &requester).await?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("report")
        .to_string();

    Response::builder()
        .header(header::CONTENT_TYPE, report.format.content_type())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(bytes.into())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    fn report(status: ReportStatus, file_path: Option<&str>) -> Report {
        Report {
            id: Uuid::new_v4(),
            report_type: ReportType::UserProgress,
            title: "User Progress Report".to_string(),
            format: ReportFormat::Csv,
            status,
            parameters: ReportParameters::default(),
            file_path: file_path.map(str::to_string),
            file_size: file_path.map(|_| 64),
            error_message: None,
            created_by: Uuid::new_v4(),
            created_at: Timestamp::UNIX_EPOCH,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn completed_reports_carry_a_download_url() {
        let body = ReportBody::from(report(ReportStatus::Completed, Some("/d/out.csv")));
        assert_eq!(
            body.download_url,
            Some(format!("/reports/{}/download", body.report.id))
        );
    }

    #[test]
    fn unfinished_or_expired_reports_have_no_download_url() {
        for r in [
            report(ReportStatus::Pending, None),
            report(ReportStatus::Processing, None),
            report(ReportStatus::Failed, None),
            // Completed but artifact expired by the retention sweep.
            report(ReportStatus::Completed, None),
        ] {
            assert_eq!(ReportBody::from(r).download_url, None);
        }
    }
}
