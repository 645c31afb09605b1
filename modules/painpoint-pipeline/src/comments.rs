use ai_client::{truncate_to_char_boundary, AiError, ChatOptions, OpenAi};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Upper bound on the page text sent for extraction, in bytes.
const MAX_EXTRACTION_INPUT: usize = 100_000;

#[derive(Debug, Error)]
pub enum CommentExtractionError {
    #[error("No content to extract comments from")]
    EmptyInput,

    #[error("No comments extracted")]
    NoComments,

    #[error("comment extraction request failed: {0}")]
    Request(#[from] AiError),
}

/// Pulls the user comments out of raw page text, one comment per entry.
#[async_trait]
pub trait CommentExtractor: Send + Sync {
    async fn extract_comments(&self, content: &str) -> Result<Vec<String>, CommentExtractionError>;
}

const EXTRACTION_SYSTEM_PROMPT: &str = "You are a comment extractor. Return only the actual comments, one per line, with no additional text or formatting.";

fn build_extraction_prompt(content: &str) -> String {
    format!(
        "Extract only the user comments and discussions from the following content. \
Return ONLY the comments, one per line. Do not include any other text, formatting, or explanations.

Content:
{content}

Instructions:
- Extract only actual user comments and discussions
- Include one comment per line
- Do not include any formatting, headers, or explanations
- Do not categorize or label the comments
- Return only the text of the comments"
    )
}

/// Split a model reply into comments: one per line, trimmed, blanks dropped.
pub(crate) fn parse_comment_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`CommentExtractor`] backed by a chat model.
#[derive(Clone)]
pub struct LlmCommentExtractor {
    ai: OpenAi,
}

impl LlmCommentExtractor {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl CommentExtractor for LlmCommentExtractor {
    async fn extract_comments(&self, content: &str) -> Result<Vec<String>, CommentExtractionError> {
        if content.trim().is_empty() {
            return Err(CommentExtractionError::EmptyInput);
        }

        let input = truncate_to_char_boundary(content, MAX_EXTRACTION_INPUT);
        if input.len() < content.len() {
            warn!(
                original = content.len(),
                kept = input.len(),
                "Truncated content before comment extraction"
            );
        }

        let reply = self
            .ai
            .chat(
                EXTRACTION_SYSTEM_PROMPT,
                build_extraction_prompt(input),
                ChatOptions::default().temperature(0.3),
            )
            .await?;

        let comments = parse_comment_lines(&reply);
        if comments.is_empty() {
            return Err(CommentExtractionError::NoComments);
        }

        debug!(comments = comments.len(), "Extracted comments");
        Ok(comments)
    }
}
