//! Read-only data contracts against the analytical (relational) store.
//!
//! The relational schema itself is owned elsewhere; the collector only
//! depends on these record shapes and the [`AnalyticsSource`] trait. An
//! implementation is injected into the job runner at construction time.

use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::requester::Role;

/// Learner proficiency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for AiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AiLevel::Beginner => "beginner",
            AiLevel::Intermediate => "intermediate",
            AiLevel::Advanced => "advanced",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub role: Role,
    pub ai_level: Option<AiLevel>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub conversation_id: Uuid,
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningPathRecord {
    pub user_id: Uuid,
    pub current_level: i32,
    /// 0–100.
    pub progress: f64,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiToolRecord {
    pub name: String,
    pub category: String,
    pub difficulty: String,
    pub description: Option<String>,
}

/// Inclusive timestamp range. An open bound means "all time" on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl DateRange {
    pub const ALL_TIME: DateRange = DateRange { from: None, to: None };

    /// Build from inclusive civil dates, interpreted in UTC: `from` starts at
    /// midnight, `to` covers the whole day.
    pub fn from_dates(from: Option<Date>, to: Option<Date>) -> Result<Self, jiff::Error> {
        let from = match from {
            Some(d) => Some(d.at(0, 0, 0, 0).to_zoned(TimeZone::UTC)?.timestamp()),
            None => None,
        };
        let to = match to {
            Some(d) => Some(
                d.at(23, 59, 59, 999_999_999)
                    .to_zoned(TimeZone::UTC)?
                    .timestamp(),
            ),
            None => None,
        };
        Ok(DateRange { from, to })
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        if let Some(from) = self.from
            && ts < from
        {
            return false;
        }
        if let Some(to) = self.to
            && ts > to
        {
            return false;
        }
        true
    }
}

/// Failure while querying the analytical store.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics query failed: {0}")]
    Query(String),
}

/// Read-only view of the analytical data source. Safe to query concurrently
/// from many job runner instances.
pub trait AnalyticsSource: Send + Sync {
    /// Users whose `created_at` falls in `range`, optionally restricted to
    /// `ids` (empty slice means no restriction).
    fn users(
        &self,
        ids: &[Uuid],
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<UserRecord>, AnalyticsError>> + Send;

    fn conversations(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<ConversationRecord>, AnalyticsError>> + Send;

    fn messages(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<MessageRecord>, AnalyticsError>> + Send;

    fn learning_paths(
        &self,
    ) -> impl Future<Output = Result<Vec<LearningPathRecord>, AnalyticsError>> + Send;

    fn ai_tools(&self) -> impl Future<Output = Result<Vec<AiToolRecord>, AnalyticsError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn date_range_bounds_are_inclusive() {
        let range = DateRange::from_dates(Some(date(2024, 3, 1)), Some(date(2024, 3, 2))).unwrap();

        let start: Timestamp = "2024-03-01T00:00:00Z".parse().unwrap();
        let end: Timestamp = "2024-03-02T23:59:59Z".parse().unwrap();
        let before: Timestamp = "2024-02-29T23:59:59Z".parse().unwrap();
        let after: Timestamp = "2024-03-03T00:00:00Z".parse().unwrap();

        assert!(range.contains(start));
        assert!(range.contains(end));
        assert!(!range.contains(before));
        assert!(!range.contains(after));
    }

    #[test]
    fn open_bounds_mean_all_time() {
        let range = DateRange::ALL_TIME;
        assert!(range.contains(Timestamp::UNIX_EPOCH));
        assert!(range.contains("2099-01-01T00:00:00Z".parse().unwrap()));
    }
}
