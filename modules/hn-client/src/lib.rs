pub mod error;
pub mod types;

pub use error::{HnError, Result};
pub use types::{HnComment, HnSearchResponse, TimeRange};

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

pub const HN_API_URL: &str = "https://hn.algolia.com/api/v1";
pub const HITS_PER_PAGE: u32 = 100;

const DAY_SECS: i64 = 86_400;

pub struct HnClient {
    client: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search comments matching `query`, newest index order as Algolia ranks them.
    pub async fn search_comments(
        &self,
        query: &str,
        range: TimeRange,
        page: u32,
    ) -> Result<HnSearchResponse> {
        let url = self.search_url(query, range, page, Utc::now())?;
        debug!(%url, "Searching HN comments");

        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(HnError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Search URL for one page. `now` anchors the 24h window.
    pub fn search_url(
        &self,
        query: &str,
        range: TimeRange,
        page: u32,
        now: DateTime<Utc>,
    ) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/search", self.base_url))
            .map_err(|e| HnError::BaseUrl(e.to_string()))?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("tags", "comment");
            params.append_pair("query", query);
            if range == TimeRange::Day {
                let since = now.timestamp() - DAY_SECS;
                params.append_pair("numericFilters", &format!("created_at_i>{since}"));
            }
            params.append_pair("page", &page.to_string());
            params.append_pair("hitsPerPage", &HITS_PER_PAGE.to_string());
        }

        Ok(url)
    }
}
