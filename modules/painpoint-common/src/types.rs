use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

// --- Comment analysis ---

/// A recurring problem surfaced across one or more comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PainPoint {
    /// Specific niche problem, a short label
    pub topic: String,
    /// Number of comments mentioning this problem
    pub count: u32,
    /// Average sentiment of those mentions, from -1 (negative) to 1 (positive)
    pub sentiment: f64,
    /// Relevant comment excerpts
    pub examples: Vec<String>,
}

/// Pain points and product ideas found in a body of comments.
///
/// The same shape describes the partial result for one chunk and the merged
/// result for a whole submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub pain_points: Vec<PainPoint>,
    /// Each idea is a specific micro-SaaS solution, formatted as
    /// 'A [type] tool for [specific user] to [solve specific problem]'
    pub potential_ideas: Vec<String>,
    /// Overall sentiment across all comments, from -1 to 1
    pub sentiment_score: f64,
    /// Number of comments analyzed
    pub total_comments: u32,
}

impl Analysis {
    /// Check the numeric and labelling invariants a partial analysis must hold
    /// before it is allowed into a merge.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !in_unit_range(self.sentiment_score) {
            return Err(ValidationError::SentimentScoreOutOfRange(self.sentiment_score));
        }

        for (index, point) in self.pain_points.iter().enumerate() {
            if point.topic.trim().is_empty() {
                return Err(ValidationError::BlankTopic { index });
            }
            if point.count == 0 {
                return Err(ValidationError::ZeroCount {
                    topic: point.topic.clone(),
                });
            }
            if !in_unit_range(point.sentiment) {
                return Err(ValidationError::SentimentOutOfRange {
                    topic: point.topic.clone(),
                    sentiment: point.sentiment,
                });
            }
        }

        Ok(())
    }
}

fn in_unit_range(value: f64) -> bool {
    value.is_finite() && (-1.0..=1.0).contains(&value)
}

// --- Idea market analysis ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SimilarApp {
    pub name: String,
    pub description: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketPotential {
    /// Realistic monthly recurring revenue for a micro-SaaS in this space
    pub size: String,
    /// Market trend
    pub growth: String,
    pub opportunities: Vec<String>,
}

/// Market research for one candidate idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdeaAnalysis {
    /// Small, successful micro-SaaS products solving a similar problem
    pub similar_apps: Vec<SimilarApp>,
    pub market_potential: MarketPotential,
    /// Specific features that set a new product apart
    pub key_differentiators: Vec<String>,
    pub challenges: Vec<String>,
}

// --- Persistence ---

/// A stored analysis. Field names follow the `analyses` table columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedAnalysis {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub analysis: Analysis,
    /// Market research keyed by the exact idea string it was run for.
    #[serde(default)]
    pub market_analysis: BTreeMap<String, IdeaAnalysis>,
}

impl SavedAnalysis {
    /// Case-insensitive match on the title or any potential idea. Blank queries match.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle)
            || self
                .analysis
                .potential_ideas
                .iter()
                .any(|idea| idea.to_lowercase().contains(&needle))
    }
}
