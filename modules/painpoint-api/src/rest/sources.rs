use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hn_client::{HnSearchResponse, TimeRange};
use jina_client::ReaderError;

use super::{required_text, ApiError, ApiResult};
use crate::app::AppState;

#[derive(Deserialize)]
pub struct ProcessWebsiteRequest {
    url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessWebsiteResponse {
    raw_text: String,
    url: String,
}

#[derive(Deserialize)]
pub struct HnQuery {
    query: Option<String>,
    range: Option<String>,
    page: Option<u32>,
}

pub async fn api_process_website(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ProcessWebsiteRequest>,
) -> ApiResult<Json<ProcessWebsiteResponse>> {
    let url = required_text(body.url, "url")?;

    match state.reader.fetch(&url).await {
        Ok(page) => {
            info!(chars = page.text.chars().count(), "Fetched website content");
            Ok(Json(ProcessWebsiteResponse {
                raw_text: page.text,
                url: page.reader_url,
            }))
        }
        Err(ReaderError::InvalidUrl(msg)) => Err(ApiError::BadRequest(msg)),
        Err(e) => {
            warn!(error = %e, "Failed to fetch website");
            Err(ApiError::BadGateway("Failed to process website".into()))
        }
    }
}

pub async fn api_hn_comments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HnQuery>,
) -> ApiResult<Json<HnSearchResponse>> {
    let range = match params.range.as_deref() {
        Some(raw) => raw.parse::<TimeRange>().map_err(ApiError::BadRequest)?,
        None => TimeRange::default(),
    };
    let query = params.query.unwrap_or_default();
    let page = params.page.unwrap_or(0);

    match state.hn.search_comments(&query, range, page).await {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            warn!(error = %e, "Failed to fetch HN comments");
            Err(ApiError::BadGateway("Failed to fetch HN comments".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use painpoint_pipeline::testing::MockAnalyzer;

    use crate::app::test_support::TestApp;

    #[tokio::test]
    async fn process_website_requires_url() {
        let app = TestApp::new(MockAnalyzer::new());
        let (status, body) = app
            .send(Method::POST, "/api/process-website", Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "url is required");
    }

    #[tokio::test]
    async fn process_website_rejects_internal_targets() {
        let app = TestApp::new(MockAnalyzer::new());

        for (url, expected) in [
            ("http://169.254.169.254/latest", "private/loopback"),
            ("http://localhost:3000", "internal hosts"),
            ("ftp://example.com", "http or https"),
        ] {
            let (status, body) = app
                .send(Method::POST, "/api/process-website", Some(json!({ "url": url })))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{url}");
            assert!(body["error"].as_str().unwrap().contains(expected), "{url}");
        }
    }

    #[tokio::test]
    async fn hn_comments_rejects_unknown_range() {
        let app = TestApp::new(MockAnalyzer::new());
        let (status, body) = app
            .send(Method::GET, "/api/hn/comments?query=saas&range=week", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Unknown time range"));
    }
}
