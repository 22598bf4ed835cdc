//! Per-user learning progress: one row per user with conversation/message
//! counts and path progress, plus an aggregate summary.

use std::collections::HashMap;

use uuid::Uuid;

use mentora_core::analytics::{AnalyticsSource, DateRange};
use mentora_core::dataset::{Cell, DataSet, TableGroup};
use mentora_core::models::report::ReportParameters;

use crate::error::CollectError;

pub(crate) async fn collect<A: AnalyticsSource>(
    source: &A,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    let range = crate::param_range(params)?;
    // The date range scopes which users are included (by sign-up date);
    // activity counts cover each user's full history.
    let users = source.users(&params.user_ids, range).await?;
    let conversations = source.conversations(DateRange::ALL_TIME).await?;
    let messages = source.messages(DateRange::ALL_TIME).await?;
    let paths = source.learning_paths().await?;

    let conversation_owner: HashMap<Uuid, Uuid> =
        conversations.iter().map(|c| (c.id, c.user_id)).collect();

    let mut conversation_counts: HashMap<Uuid, i64> = HashMap::new();
    for conversation in &conversations {
        *conversation_counts.entry(conversation.user_id).or_default() += 1;
    }

    let mut message_counts: HashMap<Uuid, i64> = HashMap::new();
    for message in messages.iter().filter(|m| m.role == "user") {
        if let Some(owner) = conversation_owner.get(&message.conversation_id) {
            *message_counts.entry(*owner).or_default() += 1;
        }
    }

    let path_by_user: HashMap<Uuid, &mentora_core::analytics::LearningPathRecord> =
        paths.iter().map(|p| (p.user_id, p)).collect();

    let mut detail = TableGroup::new(
        "users",
        "User Details",
        vec![
            "ID".to_string(),
            "Name".to_string(),
            "Email".to_string(),
            "Department".to_string(),
            "AI Level".to_string(),
            "Conversations".to_string(),
            "Messages".to_string(),
            "Progress %".to_string(),
        ],
    )
    .primary();

    let mut total_conversations = 0.0;
    let mut total_messages = 0.0;
    let mut total_progress = 0.0;

    for user in &users {
        let conversation_count = conversation_counts.get(&user.id).copied().unwrap_or(0);
        let message_count = message_counts.get(&user.id).copied().unwrap_or(0);
        let progress = path_by_user.get(&user.id).map(|p| p.progress).unwrap_or(0.0);

        total_conversations += conversation_count as f64;
        total_messages += message_count as f64;
        total_progress += progress;

        detail.rows.push(vec![
            Cell::text(user.id.to_string()),
            Cell::text(user.name.clone()),
            Cell::text(user.email.clone()),
            Cell::text(user.department.clone().unwrap_or_else(|| "-".to_string())),
            Cell::text(
                user.ai_level
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "beginner".to_string()),
            ),
            Cell::Int(conversation_count),
            Cell::Int(message_count),
            Cell::Float(progress),
        ]);
    }

    let count = users.len();
    let mut summary = TableGroup::new(
        "summary",
        "Summary",
        vec![
            "Total Users".to_string(),
            "Avg Conversations".to_string(),
            "Avg Messages".to_string(),
            "Avg Progress %".to_string(),
        ],
    )
    .summary();
    summary.rows.push(vec![
        Cell::Int(count as i64),
        Cell::Float(crate::average(total_conversations, count)),
        Cell::Float(crate::average(total_messages, count)),
        Cell::Float(crate::average(total_progress, count)),
    ]);

    Ok(DataSet::new(vec![summary, detail]))
}
