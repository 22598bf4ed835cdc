//! Custom report: a composite of two or more other report types, selected
//! by `parameters.sections`. Section membership is validated at submission
//! time; this routine just stitches the component results together.

use mentora_core::analytics::AnalyticsSource;
use mentora_core::dataset::DataSet;
use mentora_core::models::report::{ReportParameters, ReportType};

use crate::error::CollectError;
use crate::{ai_usage, learning_analytics, monthly_summary, user_progress};

pub(crate) async fn collect<A: AnalyticsSource>(
    source: &A,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    let sections = params.custom_sections();
    let mut groups = Vec::new();

    for (index, section) in sections.iter().enumerate() {
        let part = match section {
            ReportType::UserProgress => user_progress::collect(source, params).await?,
            ReportType::LearningAnalytics => learning_analytics::collect(source, params).await?,
            ReportType::AiUsage => ai_usage::collect(source, params).await?,
            ReportType::MonthlySummary => monthly_summary::collect(source, params).await?,
            // Guarded by ReportParameters::validate at submission time.
            ReportType::CustomReport => {
                return Err(CollectError::InvalidFilter(
                    "custom report cannot nest another custom report".to_string(),
                ));
            }
        };

        for mut group in part.groups {
            group.key = format!("{section}.{}", group.key);
            group.title = format!("{}: {}", section_title(*section), group.title);
            // The composite's flat-table projection is the first section's
            // primary group; later sections lose the flag.
            if index > 0 {
                group.primary = false;
            }
            groups.push(group);
        }
    }

    Ok(DataSet::new(groups))
}

fn section_title(section: ReportType) -> &'static str {
    match section {
        ReportType::UserProgress => "User Progress",
        ReportType::LearningAnalytics => "Learning Analytics",
        ReportType::AiUsage => "AI Usage",
        ReportType::MonthlySummary => "Monthly Summary",
        ReportType::CustomReport => "Custom",
    }
}
