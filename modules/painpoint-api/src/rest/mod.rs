pub mod analyses;
pub mod analyze;
pub mod sources;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::warn;

use painpoint_pipeline::{
    CommentExtractionError, IdeaResearchError, PipelineError, TitleGenerationError,
};
use painpoint_store::StoreError;

/// Handler failure, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Analysis not found")]
    NotFound,

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        warn!(error = %e, "Analysis store failure");
        ApiError::Internal("Database error".into())
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        warn!(error = %e, "Analysis failed");
        ApiError::Internal(format!("Failed to analyze content: {e}"))
    }
}

impl From<CommentExtractionError> for ApiError {
    fn from(e: CommentExtractionError) -> Self {
        match e {
            CommentExtractionError::EmptyInput => ApiError::BadRequest(e.to_string()),
            CommentExtractionError::NoComments => ApiError::Unprocessable(e.to_string()),
            CommentExtractionError::Request(_) => {
                warn!(error = %e, "Comment extraction failed");
                ApiError::Internal("Failed to filter comments".into())
            }
        }
    }
}

impl From<IdeaResearchError> for ApiError {
    fn from(e: IdeaResearchError) -> Self {
        match e {
            IdeaResearchError::EmptyIdea => ApiError::BadRequest(e.to_string()),
            _ => {
                warn!(error = %e, "Idea research failed");
                ApiError::Internal("Failed to analyze idea".into())
            }
        }
    }
}

impl From<TitleGenerationError> for ApiError {
    fn from(e: TitleGenerationError) -> Self {
        warn!(error = %e, "Title generation failed");
        ApiError::Internal("Failed to generate title".into())
    }
}

/// Trimmed value of a required text field.
pub(crate) fn required_text(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(ApiError::BadRequest(format!("{field} is required"))),
    }
}
