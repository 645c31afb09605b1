use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How far back a comment search reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeRange {
    /// Comments from the last 24 hours.
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "all")]
    All,
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24h" => Ok(TimeRange::Day),
            "all" => Ok(TimeRange::All),
            other => Err(format!("Unknown time range: {other} (expected 24h or all)")),
        }
    }
}

/// A single comment hit from the Algolia search index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnComment {
    pub author: Option<String>,
    /// HTML as stored by Hacker News.
    pub comment_text: Option<String>,
    pub created_at: Option<String>,
    #[serde(rename = "objectID")]
    pub object_id: String,
    pub parent_id: Option<i64>,
    pub points: Option<i64>,
    pub story_id: Option<i64>,
    pub story_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HnSearchResponse {
    pub hits: Vec<HnComment>,
    pub nb_hits: u64,
    pub page: u32,
    pub nb_pages: u32,
    pub hits_per_page: u32,
}
