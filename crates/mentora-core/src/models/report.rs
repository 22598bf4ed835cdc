use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Which collection routine and content builder run for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    UserProgress,
    LearningAnalytics,
    AiUsage,
    MonthlySummary,
    CustomReport,
}

impl ReportType {
    pub const ALL: [ReportType; 5] = [
        ReportType::UserProgress,
        ReportType::LearningAnalytics,
        ReportType::AiUsage,
        ReportType::MonthlySummary,
        ReportType::CustomReport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::UserProgress => "user_progress",
            ReportType::LearningAnalytics => "learning_analytics",
            ReportType::AiUsage => "ai_usage",
            ReportType::MonthlySummary => "monthly_summary",
            ReportType::CustomReport => "custom_report",
        }
    }

    /// Human title used for new reports of this type.
    pub fn default_title(&self, now: Timestamp) -> String {
        match self {
            ReportType::UserProgress => "User Progress Report".to_string(),
            ReportType::LearningAnalytics => "Learning Analytics Report".to_string(),
            ReportType::AiUsage => "AI Tool Usage Report".to_string(),
            ReportType::MonthlySummary => {
                let month = now.to_zoned(jiff::tz::TimeZone::UTC).strftime("%Y-%m");
                format!("{month} Monthly Summary Report")
            }
            ReportType::CustomReport => "Custom Report".to_string(),
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format. Orthogonal to `ReportType`: any type renders to any format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Pdf,
    Excel,
    Csv,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Pdf, ReportFormat::Excel, ReportFormat::Csv];

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Excel => "xlsx",
            ReportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "application/pdf",
            ReportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ReportFormat::Csv => "text/csv",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Pdf => f.write_str("pdf"),
            ReportFormat::Excel => f.write_str("excel"),
            ReportFormat::Csv => f.write_str("csv"),
        }
    }
}

/// Lifecycle state. Transitions are monotonic and one-directional:
/// pending → processing → {completed | failed}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReportStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Completed | ReportStatus::Failed)
    }

    /// Whether `self → next` is a legal transition of the state machine.
    pub fn can_transition_to(&self, next: ReportStatus) -> bool {
        matches!(
            (self, next),
            (ReportStatus::Pending, ReportStatus::Processing)
                | (ReportStatus::Processing, ReportStatus::Completed)
                | (ReportStatus::Processing, ReportStatus::Failed)
        )
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
            ReportStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Scope filters and detail flags for a report request. Opaque to the job
/// runner; interpreted only by the data collector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportParameters {
    /// Inclusive start of the date range. Absent means "all time".
    pub date_from: Option<Date>,
    /// Inclusive end of the date range. Absent means "all time".
    pub date_to: Option<Date>,
    /// Restrict per-user reports to these users. Empty means all users.
    pub user_ids: Vec<Uuid>,
    pub user_scope: Option<String>,
    pub include_details: Option<bool>,
    /// Accepted for compatibility; chart images are not generated.
    pub include_charts: Option<bool>,
    /// Month selector for monthly summaries. Defaults to the current month.
    pub year: Option<i16>,
    pub month: Option<i8>,
    /// Component types of a custom report. Defaults to
    /// `[user_progress, learning_analytics]`.
    pub sections: Option<Vec<ReportType>>,
    pub custom_filters: serde_json::Map<String, serde_json::Value>,
}

impl ReportParameters {
    /// Section list for a custom report, applying the default composite.
    pub fn custom_sections(&self) -> Vec<ReportType> {
        self.sections.clone().unwrap_or_else(|| {
            vec![ReportType::UserProgress, ReportType::LearningAnalytics]
        })
    }

    /// Validate at submission time. Invalid parameters never create a record.
    pub fn validate(&self, report_type: ReportType) -> Result<(), ValidationError> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to)
            && from > to
        {
            return Err(ValidationError::InvertedDateRange { from, to });
        }

        if let Some(month) = self.month
            && !(1..=12).contains(&month)
        {
            return Err(ValidationError::MonthOutOfRange(month));
        }

        if let Some(year) = self.year
            && !(1..=9999).contains(&year)
        {
            return Err(ValidationError::YearOutOfRange(year));
        }

        if report_type == ReportType::CustomReport {
            let sections = self.custom_sections();
            if sections.len() < 2 {
                return Err(ValidationError::TooFewSections(sections.len()));
            }
            let mut seen = Vec::with_capacity(sections.len());
            for section in &sections {
                if *section == ReportType::CustomReport {
                    return Err(ValidationError::NestedCustomReport);
                }
                if seen.contains(section) {
                    return Err(ValidationError::DuplicateSection(section.to_string()));
                }
                seen.push(*section);
            }
        }

        Ok(())
    }
}

/// The central entity: one requested analytical artifact and its
/// generation state.
///
/// Invariant: when `status` is terminal, exactly one of `file_path` and
/// `error_message` is set; while pending/processing, neither is. The store
/// enforces this at every transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub report_type: ReportType,
    pub title: String,
    pub format: ReportFormat,
    pub status: ReportStatus,
    pub parameters: ReportParameters,
    pub file_path: Option<String>,
    pub file_size: Option<u64>,
    pub error_message: Option<String>,
    pub created_by: Uuid,
    pub created_at: Timestamp,
    /// Set at the pending→processing transition; drives stalled-job detection.
    pub started_at: Option<Timestamp>,
    /// Set exactly once, at the terminal transition.
    pub completed_at: Option<Timestamp>,
}

/// Client-facing generation progress, derived from the record plus the
/// in-flight runner's latest checkpoint when one is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressView {
    pub report_id: Uuid,
    pub status: ReportStatus,
    /// 0–100, monotonically non-decreasing within a run.
    pub progress: u8,
    pub message: String,
    pub estimated_seconds_remaining: Option<u64>,
}
