use std::sync::Arc;
use std::time::Duration;

use ai_client::OpenAi;
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hn_client::HnClient;
use jina_client::ReaderClient;
use painpoint_common::Config;
use painpoint_pipeline::{
    ChunkAnalyzer, FailurePolicy, LlmChunkAnalyzer, LlmCommentExtractor, LlmIdeaResearcher,
    LlmTitleGenerator, Pipeline, PipelineConfig, RetryingAnalyzer,
};
use painpoint_store::PgAnalysisStore;

mod app;
mod rest;

use app::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("painpoint=info".parse()?)
                .add_directive("ai_client=info".parse()?),
        )
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    let store = PgAnalysisStore::new(pool);
    store.migrate().await?;

    let timeout = Duration::from_secs(config.chunk_timeout_secs);
    let openai = OpenAi::new(&config.openai_api_key, &config.analysis_model).with_timeout(timeout);
    let deepseek = OpenAi::deepseek(&config.deepseek_api_key, &config.filter_model)
        .with_base_url(&config.deepseek_base_url)
        .with_timeout(timeout);

    let llm_analyzer = LlmChunkAnalyzer::new(openai.clone());
    let analyzer: Arc<dyn ChunkAnalyzer> = if config.chunk_max_attempts > 1 {
        Arc::new(RetryingAnalyzer::new(llm_analyzer, config.chunk_max_attempts))
    } else {
        Arc::new(llm_analyzer)
    };

    let pipeline_config = PipelineConfig {
        max_chunk_size: config.max_chunk_size,
        max_concurrent_chunks: config.max_concurrent_chunks,
        chunk_timeout: timeout,
        failure_policy: if config.skip_failed_chunks {
            FailurePolicy::SkipFailed
        } else {
            FailurePolicy::FailFast
        },
    };
    info!(
        analysis_model = %config.analysis_model,
        max_chunk_size = pipeline_config.max_chunk_size,
        max_concurrent_chunks = pipeline_config.max_concurrent_chunks,
        failure_policy = ?pipeline_config.failure_policy,
        "Pipeline configured"
    );

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(analyzer, pipeline_config),
        comments: Arc::new(LlmCommentExtractor::new(deepseek.clone())),
        researcher: Arc::new(LlmIdeaResearcher::new(openai.with_model(&config.idea_model))),
        titles: Arc::new(LlmTitleGenerator::new(deepseek.with_model(&config.title_model))),
        store: Arc::new(store),
        reader: ReaderClient::new(&config.jina_reader_url),
        hn: HnClient::new(&config.hn_api_url),
    });

    let app = build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Painpoint API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
