//! Monthly summary: one aggregate row for the selected month plus a daily
//! message time series.

use std::collections::{HashMap, HashSet};

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use uuid::Uuid;

use mentora_core::analytics::{AnalyticsSource, DateRange};
use mentora_core::dataset::{Cell, DataSet, TableGroup};
use mentora_core::models::report::ReportParameters;

use crate::error::CollectError;

pub(crate) async fn collect<A: AnalyticsSource>(
    source: &A,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    let now = Timestamp::now().to_zoned(TimeZone::UTC);
    let year = params.year.unwrap_or(now.year());
    let month = params.month.unwrap_or(now.month());

    // Validated at submission time; fallible here so an out-of-range month
    // selector can never take down the worker.
    let first =
        Date::new(year, month, 1).map_err(|e| CollectError::InvalidFilter(e.to_string()))?;
    let last = first.last_of_month();
    let range = DateRange::from_dates(Some(first), Some(last))
        .map_err(|e| CollectError::InvalidFilter(e.to_string()))?;

    let new_users = source.users(&[], range).await?.len() as i64;

    let conversations = source.conversations(range).await?;
    let active_users = conversations
        .iter()
        .map(|c| c.user_id)
        .collect::<HashSet<Uuid>>()
        .len() as i64;
    let total_conversations = conversations.len() as i64;

    let messages = source.messages(range).await?;
    let total_messages = messages.len() as i64;

    let paths = source.learning_paths().await?;
    let updated: Vec<f64> = paths
        .iter()
        .filter(|p| range.contains(p.updated_at))
        .map(|p| p.progress)
        .collect();
    let avg_progress = crate::average(updated.iter().sum(), updated.len());

    let mut summary = TableGroup::new(
        "summary",
        "Monthly Summary",
        vec![
            "Month".to_string(),
            "New Users".to_string(),
            "Active Users".to_string(),
            "Total Conversations".to_string(),
            "Total Messages".to_string(),
            "Avg Progress %".to_string(),
        ],
    )
    .summary()
    .primary();
    summary.rows.push(vec![
        Cell::text(format!("{year}-{month:02}")),
        Cell::Int(new_users),
        Cell::Int(active_users),
        Cell::Int(total_conversations),
        Cell::Int(total_messages),
        Cell::Float(avg_progress),
    ]);

    // Daily message counts, only days with activity, ascending.
    let mut by_day: HashMap<String, i64> = HashMap::new();
    for message in &messages {
        let day = message
            .timestamp
            .to_zoned(TimeZone::UTC)
            .strftime("%Y-%m-%d")
            .to_string();
        *by_day.entry(day).or_default() += 1;
    }
    let mut days: Vec<(String, i64)> = by_day.into_iter().collect();
    days.sort_by(|a, b| a.0.cmp(&b.0));

    let mut activity = TableGroup::new(
        "daily_activity",
        "Daily Activity",
        vec!["Date".to_string(), "Messages".to_string()],
    );
    for (day, count) in days {
        activity.rows.push(vec![Cell::text(day), Cell::Int(count)]);
    }

    Ok(DataSet::new(vec![summary, activity]))
}
