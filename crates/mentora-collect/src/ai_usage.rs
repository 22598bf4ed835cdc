//! AI tool usage: mention counts per tool with unique-user reach, plus
//! per-category rollups.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use mentora_core::analytics::{AnalyticsSource, DateRange};
use mentora_core::dataset::{Cell, DataSet, TableGroup};
use mentora_core::models::report::ReportParameters;

use crate::error::CollectError;

const TOP_TOOLS: usize = 20;

pub(crate) async fn collect<A: AnalyticsSource>(
    source: &A,
    params: &ReportParameters,
) -> Result<DataSet, CollectError> {
    let range = crate::param_range(params)?;
    let tools = source.ai_tools().await?;
    let messages = source.messages(range).await?;
    let conversations = source.conversations(DateRange::ALL_TIME).await?;

    let conversation_owner: HashMap<Uuid, Uuid> =
        conversations.iter().map(|c| (c.id, c.user_id)).collect();

    struct ToolStat<'a> {
        tool: &'a mentora_core::analytics::AiToolRecord,
        mentions: i64,
        unique_users: i64,
    }

    let mut stats: Vec<ToolStat<'_>> = tools
        .iter()
        .map(|tool| {
            let mut mentions = 0i64;
            let mut users: HashSet<Uuid> = HashSet::new();
            for message in &messages {
                if message.content.contains(&tool.name) {
                    mentions += 1;
                    if let Some(owner) = conversation_owner.get(&message.conversation_id) {
                        users.insert(*owner);
                    }
                }
            }
            ToolStat {
                tool,
                mentions,
                unique_users: users.len() as i64,
            }
        })
        .collect();
    stats.sort_by(|a, b| {
        b.mentions
            .cmp(&a.mentions)
            .then_with(|| a.tool.name.cmp(&b.tool.name))
    });

    let mut ranked = TableGroup::new(
        "tools",
        "AI Tool Usage",
        vec![
            "Tool".to_string(),
            "Category".to_string(),
            "Difficulty".to_string(),
            "Mentions".to_string(),
            "Unique Users".to_string(),
            "Description".to_string(),
        ],
    )
    .primary();

    // Category rollups cover every tool, not only the ranked top slice.
    let mut categories: HashMap<String, (i64, i64)> = HashMap::new();
    for stat in &stats {
        let entry = categories.entry(stat.tool.category.clone()).or_default();
        entry.0 += 1;
        entry.1 += stat.mentions;
    }

    for stat in stats.iter().take(TOP_TOOLS) {
        ranked.rows.push(vec![
            Cell::text(stat.tool.name.clone()),
            Cell::text(stat.tool.category.clone()),
            Cell::text(stat.tool.difficulty.clone()),
            Cell::Int(stat.mentions),
            Cell::Int(stat.unique_users),
            Cell::text(stat.tool.description.clone().unwrap_or_default()),
        ]);
    }

    let mut rollup = TableGroup::new(
        "category_summary",
        "Category Summary",
        vec![
            "Category".to_string(),
            "Tools".to_string(),
            "Total Mentions".to_string(),
        ],
    );
    let mut sorted: Vec<(String, (i64, i64))> = categories.into_iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    for (category, (tool_count, total_mentions)) in sorted {
        rollup.rows.push(vec![
            Cell::text(category),
            Cell::Int(tool_count),
            Cell::Int(total_mentions),
        ]);
    }

    Ok(DataSet::new(vec![ranked, rollup]))
}
