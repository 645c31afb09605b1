use std::time::Duration;

use ai_client::{AiError, OpenAi};
use async_trait::async_trait;
use painpoint_common::{Analysis, ValidationError};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single chunk could not be turned into a partial [`Analysis`].
#[derive(Debug, Error)]
pub enum ChunkAnalysisError {
    #[error("analyzer request failed: {0}")]
    Request(#[source] AiError),

    #[error("analyzer returned malformed output: {0}")]
    Malformed(String),

    #[error("analyzer output failed validation: {0}")]
    Invalid(#[from] ValidationError),

    #[error("analyzer timed out after {0:?}")]
    Timeout(Duration),
}

impl ChunkAnalysisError {
    /// Whether another attempt on the same chunk could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChunkAnalysisError::Request(e) => e.is_transient(),
            ChunkAnalysisError::Malformed(_)
            | ChunkAnalysisError::Invalid(_)
            | ChunkAnalysisError::Timeout(_) => true,
        }
    }
}

impl From<AiError> for ChunkAnalysisError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Parse(msg) => ChunkAnalysisError::Malformed(msg),
            other => ChunkAnalysisError::Request(other),
        }
    }
}

// --- ChunkAnalyzer trait ---

/// Turns one chunk of comment text into a validated partial analysis.
///
/// Calls are independent of each other and may run concurrently.
#[async_trait]
pub trait ChunkAnalyzer: Send + Sync {
    async fn analyze_chunk(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError>;
}

const ANALYSIS_SYSTEM_PROMPT: &str = r#"You analyze user comments from forums and discussion threads to find micro-SaaS opportunities: specific, niche problems that a simple piece of software could solve.

## Pain Points
- Identify specific, recurring problems that affect a niche group of users.
- `topic` is a short, specific label for the problem (not a generic category like "software issues").
- `count` is the number of comments that mention the problem. Always at least 1.
- `sentiment` is the average sentiment of those comments, from -1 (very negative) to 1 (very positive).
- `examples` are short excerpts quoted from the comments.

## Potential Ideas
For each major pain point, suggest a focused SaaS solution that:
- Solves one specific problem well
- Can be built by a small team
- Has clear monetization potential
- Could reach $5k-20k MRR
Phrase each idea as: "A [type] tool for [specific user] to [solve specific problem]".

## Totals
- `totalComments` is the number of distinct comments in the input.
- `sentimentScore` is the overall sentiment of all comments, from -1 to 1.

Only report what the comments support. Return an empty list rather than inventing pain points."#;

fn build_user_prompt(chunk: &str) -> String {
    format!("Analyze these user comments.\n\nComments:\n{chunk}")
}

/// [`ChunkAnalyzer`] backed by a chat model with strict structured output.
#[derive(Clone)]
pub struct LlmChunkAnalyzer {
    ai: OpenAi,
}

impl LlmChunkAnalyzer {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl ChunkAnalyzer for LlmChunkAnalyzer {
    async fn analyze_chunk(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError> {
        debug!(model = self.ai.model(), chars = chunk.chars().count(), "Analyzing chunk");

        let analysis: Analysis = self
            .ai
            .extract(ANALYSIS_SYSTEM_PROMPT, build_user_prompt(chunk))
            .await?;

        analysis.validate()?;
        Ok(analysis)
    }
}

// --- Retries ---

/// Bounded retry with exponential backoff around any analyzer.
///
/// Only retryable failures are retried; the last error is returned once
/// `max_attempts` is spent.
pub struct RetryingAnalyzer<A> {
    inner: A,
    max_attempts: u32,
    base_delay: Duration,
}

impl<A: ChunkAnalyzer> RetryingAnalyzer<A> {
    pub fn new(inner: A, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }
}

#[async_trait]
impl<A: ChunkAnalyzer> ChunkAnalyzer for RetryingAnalyzer<A> {
    async fn analyze_chunk(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.analyze_chunk(chunk).await {
                Ok(analysis) => return Ok(analysis),
                Err(e) if attempt < self.max_attempts && e.is_retryable() => {
                    let backoff = self.base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Chunk analysis failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, pain_point, MockAnalyzer};

    #[test]
    fn parse_errors_become_malformed() {
        let err = ChunkAnalysisError::from(AiError::Parse("expected value".into()));
        assert!(matches!(err, ChunkAnalysisError::Malformed(_)));
    }

    #[test]
    fn transport_errors_stay_request_errors() {
        let err = ChunkAnalysisError::from(AiError::Network("connection reset".into()));
        assert!(matches!(err, ChunkAnalysisError::Request(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        let err = ChunkAnalysisError::from(AiError::Api {
            status: 401,
            message: "bad key".into(),
        });
        assert!(!err.is_retryable());
    }

    #[test]
    fn user_prompt_embeds_chunk() {
        let prompt = build_user_prompt("my CI is slow");
        assert!(prompt.ends_with("my CI is slow"));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let ok = analysis(vec![pain_point("Slow builds", 2, -0.4)], vec![], -0.4, 2);
        let mock = MockAnalyzer::new()
            .fail_times(2, || ChunkAnalysisError::Malformed("truncated".into()))
            .with_default(ok.clone());
        let retrying = RetryingAnalyzer::new(mock, 3).with_base_delay(Duration::from_millis(1));

        let result = retrying.analyze_chunk("chunk").await.unwrap();
        assert_eq!(result, ok);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mock = MockAnalyzer::new()
            .fail_times(5, || ChunkAnalysisError::Malformed("truncated".into()));
        let retrying = RetryingAnalyzer::new(mock, 2).with_base_delay(Duration::from_millis(1));

        let err = retrying.analyze_chunk("chunk").await.unwrap_err();
        assert!(matches!(err, ChunkAnalysisError::Malformed(_)));
        assert_eq!(retrying.inner.calls().len(), 2);
    }

    #[tokio::test]
    async fn does_not_retry_permanent_failures() {
        let mock = MockAnalyzer::new().fail_times(5, || {
            ChunkAnalysisError::Request(AiError::Api {
                status: 400,
                message: "invalid schema".into(),
            })
        });
        let retrying = RetryingAnalyzer::new(mock, 4).with_base_delay(Duration::from_millis(1));

        assert!(retrying.analyze_chunk("chunk").await.is_err());
        assert_eq!(retrying.inner.calls().len(), 1);
    }
}
