//! Learning analytics: AI-level distribution, top tools by usage, and
//! hourly activity buckets.

use std::collections::HashMap;

use jiff::tz::TimeZone;

use mentora_core::analytics::{AiLevel, AnalyticsSource, DateRange};
use mentora_core::dataset::{Cell, DataSet, TableGroup};
use mentora_core::models::report::ReportParameters;

use crate::error::CollectError;

const TOP_TOOLS: usize = 10;

pub(crate) async fn collect<A: AnalyticsSource>(
    source: &A,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    let range = crate::param_range(params)?;
    let users = source.users(&[], range).await?;
    let messages = source.messages(DateRange::ALL_TIME).await?;
    let tools = source.ai_tools().await?;

    // Level distribution over the ranged user set, in a fixed level order.
    let mut by_level: HashMap<&'static str, i64> = HashMap::new();
    for user in &users {
        let key = match user.ai_level {
            Some(AiLevel::Beginner) => "beginner",
            Some(AiLevel::Intermediate) => "intermediate",
            Some(AiLevel::Advanced) => "advanced",
            None => "unknown",
        };
        *by_level.entry(key).or_default() += 1;
    }

    let mut distribution = TableGroup::new(
        "level_distribution",
        "AI Level Distribution",
        vec!["Level".to_string(), "Users".to_string()],
    );
    for level in ["beginner", "intermediate", "advanced", "unknown"] {
        if let Some(count) = by_level.get(level) {
            distribution
                .rows
                .push(vec![Cell::text(level), Cell::Int(*count)]);
        }
    }

    // Top tools by message mentions, full message history.
    let mut ranked: Vec<(&_, i64)> = tools
        .iter()
        .map(|tool| {
            let mentions = messages
                .iter()
                .filter(|m| m.content.contains(&tool.name))
                .count() as i64;
            (tool, mentions)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.name.cmp(&b.0.name)));

    let mut popular = TableGroup::new(
        "popular_tools",
        "Popular AI Tools",
        vec![
            "Tool".to_string(),
            "Category".to_string(),
            "Difficulty".to_string(),
            "Usage Count".to_string(),
        ],
    )
    .primary();
    for (tool, mentions) in ranked.into_iter().take(TOP_TOOLS) {
        popular.rows.push(vec![
            Cell::text(tool.name.clone()),
            Cell::text(tool.category.clone()),
            Cell::text(tool.difficulty.clone()),
            Cell::Int(mentions),
        ]);
    }

    // Hour-of-day buckets, only hours with activity, ascending.
    let mut by_hour: HashMap<i8, i64> = HashMap::new();
    for message in &messages {
        let hour = message.timestamp.to_zoned(TimeZone::UTC).hour();
        *by_hour.entry(hour).or_default() += 1;
    }
    let mut hours: Vec<(i8, i64)> = by_hour.into_iter().collect();
    hours.sort_by_key(|(hour, _)| *hour);

    let mut activity = TableGroup::new(
        "hourly_activity",
        "Hourly Activity",
        vec!["Hour".to_string(), "Messages".to_string()],
    );
    for (hour, count) in hours {
        activity
            .rows
            .push(vec![Cell::Int(hour as i64), Cell::Int(count)]);
    }

    Ok(DataSet::new(vec![distribution, popular, activity]))
}
