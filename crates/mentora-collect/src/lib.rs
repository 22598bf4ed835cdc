//! mentora-collect
//!
//! The data collector: a pure function from `(report_type, parameters)` to a
//! structured result set, one routine per report type. Collection tolerates
//! empty data (zero users, zero conversations) and returns zero-valued
//! summaries instead of failing.

pub mod error;

mod ai_usage;
mod custom;
mod learning_analytics;
mod monthly_summary;
mod user_progress;

use tracing::debug;

use mentora_core::analytics::{AnalyticsSource, DateRange};
use mentora_core::dataset::DataSet;
use mentora_core::models::report::{ReportParameters, ReportType};

use crate::error::CollectError;

/// Run the collection routine for `report_type` against `source`.
pub async fn collect<A: AnalyticsSource>(
    source: &A,
    report_type: ReportType,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    debug!(report_type = %report_type, "collecting report data");
    match report_type {
        ReportType::UserProgress => user_progress::collect(source, params).await,
        ReportType::LearningAnalytics => learning_analytics::collect(source, params).await,
        ReportType::AiUsage => ai_usage::collect(source, params).await,
        ReportType::MonthlySummary => monthly_summary::collect(source, params).await,
        ReportType::CustomReport => custom::collect(source, params).await,
    }
}

/// Inclusive range from the request parameters; all time when absent.
fn param_range(params: &ReportParameters) -> Result<DateRange, CollectError> {
    DateRange::from_dates(params.date_from, params.date_to)
        .map_err(|e| CollectError::InvalidFilter(e.to_string()))
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}
