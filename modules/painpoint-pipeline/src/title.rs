use ai_client::{strip_wrapping_quotes, AiError, ChatOptions, OpenAi};
use async_trait::async_trait;
use painpoint_common::PainPoint;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TitleGenerationError {
    #[error("Failed to generate title")]
    Empty,

    #[error("title request failed: {0}")]
    Request(#[from] AiError),
}

/// Short human-readable title for an analysis.
#[async_trait]
pub trait TitleGenerator: Send + Sync {
    async fn generate_title(
        &self,
        pain_points: &[PainPoint],
        ideas: &[String],
    ) -> Result<String, TitleGenerationError>;
}

const TITLE_SYSTEM_PROMPT: &str = "You write short, specific titles for summaries of user feedback.";

pub fn build_title_prompt(pain_points: &[PainPoint], ideas: &[String]) -> String {
    let points = pain_points
        .iter()
        .map(|p| format!("- {} ({} mentions)", p.topic, p.count))
        .collect::<Vec<_>>()
        .join("\n");
    let ideas = ideas
        .iter()
        .map(|idea| format!("- {idea}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on the following analysis of user feedback, generate a concise and descriptive title \
(max 5 words) that captures the main theme or focus:

Pain Points:
{points}

Potential Ideas:
{ideas}

Generate only the title, nothing else. Make it specific and descriptive."
    )
}

#[derive(Clone)]
pub struct LlmTitleGenerator {
    ai: OpenAi,
}

impl LlmTitleGenerator {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl TitleGenerator for LlmTitleGenerator {
    async fn generate_title(
        &self,
        pain_points: &[PainPoint],
        ideas: &[String],
    ) -> Result<String, TitleGenerationError> {
        let reply = self
            .ai
            .chat(
                TITLE_SYSTEM_PROMPT,
                build_title_prompt(pain_points, ideas),
                ChatOptions::default().temperature(0.7).max_tokens(50),
            )
            .await?;

        let title = strip_wrapping_quotes(&reply);
        if title.is_empty() {
            return Err(TitleGenerationError::Empty);
        }

        debug!(title, "Generated title");
        Ok(title.to_string())
    }
}
