use async_trait::async_trait;
use painpoint_common::{Analysis, IdeaAnalysis, SavedAnalysis};
use uuid::Uuid;

use crate::error::Result;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Saved analyses, each with a market-research map keyed by idea.
///
/// Lookups by id return `None` when no row exists; updates and deletes on a
/// missing id are not errors.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn insert(&self, title: &str, analysis: &Analysis) -> Result<SavedAnalysis>;

    /// Newest first.
    async fn list(&self, limit: i64) -> Result<Vec<SavedAnalysis>>;

    async fn get(&self, id: Uuid) -> Result<Option<SavedAnalysis>>;

    async fn update_title(&self, id: Uuid, title: &str) -> Result<Option<SavedAnalysis>>;

    /// Set the research for one idea, leaving the other ideas' entries as they are.
    async fn put_market_analysis(
        &self,
        id: Uuid,
        idea: &str,
        research: &IdeaAnalysis,
    ) -> Result<Option<SavedAnalysis>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Clamp a requested page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIST_LIMIT)
}
