use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use hn_client::HnClient;
use jina_client::ReaderClient;
use painpoint_pipeline::{CommentExtractor, IdeaResearcher, Pipeline, TitleGenerator};
use painpoint_store::AnalysisStore;

use crate::rest;

/// Pasted discussion threads can be large.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

pub struct AppState {
    pub pipeline: Pipeline,
    pub comments: Arc<dyn CommentExtractor>,
    pub researcher: Arc<dyn IdeaResearcher>,
    pub titles: Arc<dyn TitleGenerator>,
    pub store: Arc<dyn AnalysisStore>,
    pub reader: ReaderClient,
    pub hn: HnClient,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Model flows
        .route("/api/analyze", post(rest::analyze::api_analyze))
        .route("/api/filter-comments", post(rest::analyze::api_filter_comments))
        .route("/api/analyze-idea", post(rest::analyze::api_analyze_idea))
        .route("/api/generate-title", post(rest::analyze::api_generate_title))
        // Content sources
        .route("/api/process-website", post(rest::sources::api_process_website))
        .route("/api/hn/comments", get(rest::sources::api_hn_comments))
        // Saved analyses
        .route(
            "/api/analyses",
            get(rest::analyses::api_list_analyses).post(rest::analyses::api_create_analysis),
        )
        .route("/api/analyses/run", post(rest::analyses::api_run_analysis))
        .route(
            "/api/analyses/{id}",
            get(rest::analyses::api_get_analysis)
                .patch(rest::analyses::api_update_analysis)
                .delete(rest::analyses::api_delete_analysis),
        )
        .route("/api/analyses/{id}/title", post(rest::analyses::api_regenerate_title))
        .route("/api/analyses/{id}/ideas", post(rest::analyses::api_research_idea))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Logging layer: method + path only (submitted content never reaches the logs)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
