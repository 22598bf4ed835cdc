//! Vec-backed [`AnalyticsSource`] implementation.
//!
//! The production analytical store is an external relational database; this
//! in-memory source implements the same read contracts for process wiring
//! without a database and for collector/pipeline tests.

use uuid::Uuid;

use mentora_core::analytics::{
    AiToolRecord, AnalyticsError, AnalyticsSource, ConversationRecord, DateRange,
    LearningPathRecord, MessageRecord, UserRecord,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryAnalytics {
    pub users: Vec<UserRecord>,
    pub conversations: Vec<ConversationRecord>,
    pub messages: Vec<MessageRecord>,
    pub learning_paths: Vec<LearningPathRecord>,
    pub ai_tools: Vec<AiToolRecord>,
}

impl AnalyticsSource for MemoryAnalytics {
    async fn users(&self, ids: &[Uuid], range: DateRange) -> Result<Vec<UserRecord>, AnalyticsError> {
        Ok(self
            .users
            .iter()
            .filter(|u| ids.is_empty() || ids.contains(&u.id))
            .filter(|u| range.contains(u.created_at))
            .cloned()
            .collect())
    }

    async fn conversations(
        &self,
        range: DateRange,
    ) -> Result<Vec<ConversationRecord>, AnalyticsError> {
        Ok(self
            .conversations
            .iter()
            .filter(|c| range.contains(c.created_at))
            .cloned()
            .collect())
    }

    async fn messages(&self, range: DateRange) -> Result<Vec<MessageRecord>, AnalyticsError> {
        Ok(self
            .messages
            .iter()
            .filter(|m| range.contains(m.timestamp))
            .cloned()
            .collect())
    }

    async fn learning_paths(&self) -> Result<Vec<LearningPathRecord>, AnalyticsError> {
        Ok(self.learning_paths.clone())
    }

    async fn ai_tools(&self) -> Result<Vec<AiToolRecord>, AnalyticsError> {
        Ok(self.ai_tools.clone())
    }
}
