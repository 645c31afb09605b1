use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use painpoint_common::{Analysis, IdeaAnalysis, PainPoint};

use super::{required_text, ApiError, ApiResult};
use crate::app::AppState;

#[derive(Deserialize)]
pub struct ContentRequest {
    content: Option<String>,
}

#[derive(Deserialize)]
pub struct IdeaRequest {
    idea: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTitleRequest {
    #[serde(default)]
    pain_points: Vec<PainPoint>,
    #[serde(default)]
    ideas: Vec<String>,
}

#[derive(Serialize)]
pub struct CommentsResponse {
    comments: Vec<String>,
}

#[derive(Serialize)]
pub struct TitleResponse {
    title: String,
}

/// Chunk, analyze and merge. No chunks at all is a 422.
pub(crate) async fn analyze_content(state: &AppState, content: &str) -> ApiResult<Analysis> {
    match state.pipeline.run(content).await? {
        Some(analysis) => Ok(analysis),
        None => Err(ApiError::Unprocessable(
            "Content has no text to analyze".into(),
        )),
    }
}

pub async fn api_analyze(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContentRequest>,
) -> ApiResult<Json<Analysis>> {
    let content = required_text(body.content, "content")?;
    info!(chars = content.chars().count(), "Analysis requested");
    let analysis = analyze_content(&state, &content).await?;
    Ok(Json(analysis))
}

pub async fn api_filter_comments(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContentRequest>,
) -> ApiResult<Json<CommentsResponse>> {
    let content = required_text(body.content, "content")?;
    let comments = state.comments.extract_comments(&content).await?;
    Ok(Json(CommentsResponse { comments }))
}

pub async fn api_analyze_idea(
    State(state): State<Arc<AppState>>,
    Json(body): Json<IdeaRequest>,
) -> ApiResult<Json<IdeaAnalysis>> {
    let idea = required_text(body.idea, "idea")?;
    let research = state.researcher.research(&idea).await?;
    Ok(Json(research))
}

pub async fn api_generate_title(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateTitleRequest>,
) -> ApiResult<Json<TitleResponse>> {
    let title = state
        .titles
        .generate_title(&body.pain_points, &body.ideas)
        .await?;
    Ok(Json(TitleResponse { title }))
}
