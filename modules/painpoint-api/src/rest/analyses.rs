use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use painpoint_common::{Analysis, SavedAnalysis};
use painpoint_store::{clamp_limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

use super::analyze::analyze_content;
use super::{required_text, ApiError, ApiResult};
use crate::app::AppState;

/// Used when a title could not be generated for a finished analysis.
const FALLBACK_TITLE: &str = "Untitled analysis";

#[derive(Deserialize)]
pub struct ListQuery {
    q: Option<String>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateAnalysisRequest {
    title: Option<String>,
    analysis: Analysis,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAnalysisRequest {
    content: Option<String>,
    title: Option<String>,
    #[serde(default)]
    filter_comments: bool,
}

#[derive(Deserialize)]
pub struct UpdateAnalysisRequest {
    title: Option<String>,
}

#[derive(Deserialize)]
pub struct ResearchIdeaRequest {
    idea: Option<String>,
}

pub async fn api_list_analyses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> ApiResult<Json<Vec<SavedAnalysis>>> {
    let limit = clamp_limit(params.limit.unwrap_or(DEFAULT_LIST_LIMIT)) as usize;
    let query = params.q.unwrap_or_default();

    // Search runs over the newest page of rows, then the limit applies.
    let rows = state.store.list(MAX_LIST_LIMIT).await?;
    let matches = rows
        .into_iter()
        .filter(|row| row.matches_query(&query))
        .take(limit)
        .collect();
    Ok(Json(matches))
}

pub async fn api_create_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateAnalysisRequest>,
) -> ApiResult<(StatusCode, Json<SavedAnalysis>)> {
    let title = required_text(body.title, "title")?;
    body.analysis
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Invalid analysis: {e}")))?;

    let saved = state.store.insert(&title, &body.analysis).await?;
    info!(id = %saved.id, "Analysis saved");
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Extract comments (optionally), analyze, title and persist in one call.
pub async fn api_run_analysis(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunAnalysisRequest>,
) -> ApiResult<(StatusCode, Json<SavedAnalysis>)> {
    let content = required_text(body.content, "content")?;

    let content = if body.filter_comments {
        let comments = state.comments.extract_comments(&content).await?;
        info!(comments = comments.len(), "Filtered comments before analysis");
        comments.join("\n\n")
    } else {
        content
    };

    let analysis = analyze_content(&state, &content).await?;

    let title = match body.title.filter(|t| !t.trim().is_empty()) {
        Some(title) => title.trim().to_string(),
        None => match state
            .titles
            .generate_title(&analysis.pain_points, &analysis.potential_ideas)
            .await
        {
            Ok(title) => title,
            Err(e) => {
                warn!(error = %e, "Title generation failed, saving with fallback title");
                FALLBACK_TITLE.to_string()
            }
        },
    };

    let saved = state.store.insert(&title, &analysis).await?;
    info!(
        id = %saved.id,
        pain_points = saved.analysis.pain_points.len(),
        "Analysis run saved"
    );
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn api_get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SavedAnalysis>> {
    state.store.get(id).await?.map(Json).ok_or(ApiError::NotFound)
}

pub async fn api_update_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAnalysisRequest>,
) -> ApiResult<Json<SavedAnalysis>> {
    let title = required_text(body.title, "title")?;
    state
        .store
        .update_title(id, &title)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Generate a fresh title from the stored analysis and persist it.
pub async fn api_regenerate_title(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SavedAnalysis>> {
    let saved = state.store.get(id).await?.ok_or(ApiError::NotFound)?;
    let title = state
        .titles
        .generate_title(&saved.analysis.pain_points, &saved.analysis.potential_ideas)
        .await?;

    state
        .store
        .update_title(id, &title)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Run market research for one idea and store it under that idea.
pub async fn api_research_idea(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResearchIdeaRequest>,
) -> ApiResult<Json<SavedAnalysis>> {
    let idea = required_text(body.idea, "idea")?;
    if state.store.get(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let research = state.researcher.research(&idea).await?;
    state
        .store
        .put_market_analysis(id, &idea, &research)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn api_delete_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.delete(id).await? {
        info!(%id, "Analysis deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
