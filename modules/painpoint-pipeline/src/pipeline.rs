use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use painpoint_common::Analysis;
use thiserror::Error;
use tracing::{info, warn};

use crate::analyzer::{ChunkAnalysisError, ChunkAnalyzer};
use crate::chunker::{split_into_chunks, DEFAULT_MAX_CHUNK_SIZE};
use crate::merge::{AnalysisMerger, WeightedMerger};

/// What the orchestrator does when some chunk analyses fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// The first failure fails the run and cancels the analyses still in flight.
    #[default]
    FailFast,
    /// Await every chunk and merge the ones that succeeded. Fails only if none did.
    SkipFailed,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_chunk_size: usize,
    pub max_concurrent_chunks: usize,
    pub chunk_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_concurrent_chunks: 4,
            chunk_timeout: Duration::from_secs(120),
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to analyze chunk {} of {total}: {source}", .index + 1)]
    ChunkFailed {
        index: usize,
        total: usize,
        source: ChunkAnalysisError,
    },

    #[error("All {total} chunks failed to analyze: {first}")]
    AllChunksFailed {
        total: usize,
        #[source]
        first: ChunkAnalysisError,
    },
}

/// Chunk → concurrent analysis → merge.
pub struct Pipeline {
    analyzer: Arc<dyn ChunkAnalyzer>,
    merger: Arc<dyn AnalysisMerger>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(analyzer: Arc<dyn ChunkAnalyzer>, config: PipelineConfig) -> Self {
        Self {
            analyzer,
            merger: Arc::new(WeightedMerger),
            config,
        }
    }

    pub fn with_merger(mut self, merger: Arc<dyn AnalysisMerger>) -> Self {
        self.merger = merger;
        self
    }

    /// Analyze `content` end to end.
    ///
    /// `Ok(None)` means the content held no paragraphs to analyze. The merge
    /// step only runs once every chunk analysis it depends on has resolved.
    pub async fn run(&self, content: &str) -> Result<Option<Analysis>, PipelineError> {
        let chunks = split_into_chunks(content, self.config.max_chunk_size.max(1));
        info!(
            chunks = chunks.len(),
            chars = content.chars().count(),
            "Split content into chunks"
        );

        if chunks.is_empty() {
            return Ok(None);
        }

        let partials = match self.config.failure_policy {
            FailurePolicy::FailFast => self.analyze_all(&chunks).await?,
            FailurePolicy::SkipFailed => self.analyze_surviving(&chunks).await?,
        };
        info!(partials = partials.len(), "Analyzed chunks");

        let merged = self.merger.merge(partials);
        if let Some(ref analysis) = merged {
            info!(
                pain_points = analysis.pain_points.len(),
                ideas = analysis.potential_ideas.len(),
                total_comments = analysis.total_comments,
                "Merged chunk analyses"
            );
        }
        Ok(merged)
    }

    async fn analyze_one(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError> {
        match tokio::time::timeout(self.config.chunk_timeout, self.analyzer.analyze_chunk(chunk))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ChunkAnalysisError::Timeout(self.config.chunk_timeout)),
        }
    }

    /// Fail-fast join. Returning early drops the stream, which cancels every
    /// analysis still in flight.
    async fn analyze_all(&self, chunks: &[String]) -> Result<Vec<Analysis>, PipelineError> {
        let total = chunks.len();

        let mut indexed: Vec<(usize, Analysis)> = stream::iter(0..total)
            .map(|index| async move {
                self.analyze_one(&chunks[index])
                    .await
                    .map(|analysis| (index, analysis))
                    .map_err(|source| {
                        warn!(chunk = index, total, error = %source, "Chunk analysis failed");
                        PipelineError::ChunkFailed {
                            index,
                            total,
                            source,
                        }
                    })
            })
            .buffer_unordered(self.concurrency())
            .try_collect()
            .await?;

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, analysis)| analysis).collect())
    }

    async fn analyze_surviving(&self, chunks: &[String]) -> Result<Vec<Analysis>, PipelineError> {
        let total = chunks.len();

        let mut outcomes: Vec<(usize, Result<Analysis, ChunkAnalysisError>)> =
            stream::iter(0..total)
                .map(|index| async move { (index, self.analyze_one(&chunks[index]).await) })
                .buffer_unordered(self.concurrency())
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut partials = Vec::with_capacity(total);
        let mut first_failure = None;
        for (index, outcome) in outcomes {
            match outcome {
                Ok(analysis) => partials.push(analysis),
                Err(e) => {
                    warn!(chunk = index, total, error = %e, "Chunk analysis failed, skipping");
                    first_failure.get_or_insert(e);
                }
            }
        }

        match first_failure {
            Some(first) if partials.is_empty() => Err(PipelineError::AllChunksFailed { total, first }),
            Some(_) => {
                warn!(
                    succeeded = partials.len(),
                    failed = total - partials.len(),
                    "Merging partial chunk results"
                );
                Ok(partials)
            }
            None => Ok(partials),
        }
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrent_chunks.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{analysis, pain_point, MockAnalyzer, SpyMerger};

    fn paragraphs(n: usize, width: usize) -> String {
        (0..n)
            .map(|i| format!("comment-{i} {}", "x".repeat(width)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn config(max_chunk_size: usize) -> PipelineConfig {
        PipelineConfig {
            max_chunk_size,
            max_concurrent_chunks: 4,
            chunk_timeout: Duration::from_secs(5),
            failure_policy: FailurePolicy::FailFast,
        }
    }

    #[tokio::test]
    async fn empty_content_yields_none_without_calling_analyzer() {
        let mock = Arc::new(MockAnalyzer::new());
        let pipeline = Pipeline::new(mock.clone(), config(100));

        assert_eq!(pipeline.run("  \n\n ").await.unwrap(), None);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn single_chunk_result_passes_through() {
        let partial = analysis(vec![pain_point("Pricing", 3, -0.5)], vec!["Idea"], -0.5, 3);
        let mock = Arc::new(MockAnalyzer::new().with_default(partial.clone()));
        let pipeline = Pipeline::new(mock.clone(), config(1_000));

        let merged = pipeline.run("one short thread").await.unwrap();
        assert_eq!(merged, Some(partial));
        assert_eq!(mock.calls(), vec!["one short thread"]);
    }

    #[tokio::test]
    async fn merges_results_from_every_chunk() {
        let mock = Arc::new(
            MockAnalyzer::new()
                .on_chunk(
                    "comment-0",
                    analysis(vec![pain_point("Slow builds", 3, -0.2)], vec!["Cache"], 0.5, 10),
                )
                .on_chunk(
                    "comment-1",
                    analysis(vec![pain_point("slow builds", 5, -0.6)], vec!["Cache"], -0.5, 30),
                ),
        );
        // Each paragraph is ~30 chars; a 40-char limit forces one chunk per paragraph.
        let pipeline = Pipeline::new(mock.clone(), config(40));

        let merged = pipeline.run(&paragraphs(2, 20)).await.unwrap().unwrap();

        assert_eq!(mock.calls().len(), 2);
        assert_eq!(merged.total_comments, 40);
        assert!((merged.sentiment_score + 0.25).abs() < 1e-9);
        assert_eq!(merged.pain_points.len(), 1);
        assert_eq!(merged.pain_points[0].count, 8);
        assert_eq!(merged.potential_ideas, vec!["Cache"]);
    }

    #[tokio::test]
    async fn one_failure_fails_the_run_and_skips_merge() {
        let ok = analysis(vec![], vec![], 0.0, 1);
        let mock = Arc::new(
            MockAnalyzer::new()
                .with_default(ok)
                .fail_on("comment-2", || ChunkAnalysisError::Malformed("not json".into())),
        );
        let spy = Arc::new(SpyMerger::new());
        let pipeline = Pipeline::new(mock, config(40)).with_merger(spy.clone());

        let err = pipeline.run(&paragraphs(5, 20)).await.unwrap_err();

        match err {
            PipelineError::ChunkFailed { index, total, source } => {
                assert_eq!(index, 2);
                assert_eq!(total, 5);
                assert!(matches!(source, ChunkAnalysisError::Malformed(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(spy.merge_calls(), 0);
    }

    #[tokio::test]
    async fn failure_cancels_in_flight_analyses() {
        let mock = Arc::new(
            MockAnalyzer::new()
                .hang_on("comment-0")
                .fail_on("comment-1", || ChunkAnalysisError::Malformed("bad".into())),
        );
        let pipeline = Pipeline::new(mock.clone(), config(40));

        let outcome =
            tokio::time::timeout(Duration::from_secs(2), pipeline.run(&paragraphs(2, 20))).await;

        let result = outcome.expect("fail-fast run must not wait for the hung chunk");
        assert!(matches!(result, Err(PipelineError::ChunkFailed { index: 1, .. })));
        assert_eq!(mock.in_flight(), 0);
    }

    #[tokio::test]
    async fn slow_chunk_times_out() {
        let mock = Arc::new(MockAnalyzer::new().hang_on("comment"));
        let mut cfg = config(1_000);
        cfg.chunk_timeout = Duration::from_millis(20);
        let pipeline = Pipeline::new(mock, cfg);

        let err = pipeline.run("comment that never finishes").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ChunkFailed {
                source: ChunkAnalysisError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let mock = Arc::new(
            MockAnalyzer::new()
                .with_default(analysis(vec![], vec![], 0.0, 1))
                .with_delay(Duration::from_millis(15)),
        );
        let mut cfg = config(40);
        cfg.max_concurrent_chunks = 3;
        let pipeline = Pipeline::new(mock.clone(), cfg);

        let merged = pipeline.run(&paragraphs(10, 20)).await.unwrap().unwrap();

        assert_eq!(merged.total_comments, 10);
        assert_eq!(mock.calls().len(), 10);
        assert!(mock.max_in_flight() <= 3, "saw {} in flight", mock.max_in_flight());
        assert!(mock.max_in_flight() >= 2);
    }

    #[tokio::test]
    async fn partials_are_merged_in_chunk_order() {
        // Later chunks finish first; merge order must still follow the input.
        let mock = Arc::new(
            MockAnalyzer::new()
                .on_chunk("comment-0", analysis(vec![pain_point("First", 1, 0.0)], vec!["A"], 0.0, 1))
                .on_chunk("comment-1", analysis(vec![pain_point("Second", 1, 0.0)], vec!["B"], 0.0, 1))
                .on_chunk("comment-2", analysis(vec![pain_point("Third", 1, 0.0)], vec!["C"], 0.0, 1))
                .delay_on("comment-0", Duration::from_millis(30)),
        );
        let pipeline = Pipeline::new(mock, config(40));

        let merged = pipeline.run(&paragraphs(3, 20)).await.unwrap().unwrap();
        let topics: Vec<&str> = merged.pain_points.iter().map(|p| p.topic.as_str()).collect();
        assert_eq!(topics, vec!["First", "Second", "Third"]);
        assert_eq!(merged.potential_ideas, vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn skip_failed_merges_the_survivors() {
        let mock = Arc::new(
            MockAnalyzer::new()
                .with_default(analysis(vec![], vec![], 0.5, 2))
                .fail_on("comment-1", || ChunkAnalysisError::Malformed("bad".into())),
        );
        let mut cfg = config(40);
        cfg.failure_policy = FailurePolicy::SkipFailed;
        let spy = Arc::new(SpyMerger::new());
        let pipeline = Pipeline::new(mock, cfg).with_merger(spy.clone());

        let merged = pipeline.run(&paragraphs(3, 20)).await.unwrap().unwrap();
        assert_eq!(merged.total_comments, 4);
        assert_eq!(spy.merge_calls(), 1);
    }

    #[tokio::test]
    async fn skip_failed_errors_when_nothing_survives() {
        let mock = Arc::new(
            MockAnalyzer::new().fail_on("comment", || ChunkAnalysisError::Malformed("bad".into())),
        );
        let mut cfg = config(40);
        cfg.failure_policy = FailurePolicy::SkipFailed;
        let spy = Arc::new(SpyMerger::new());
        let pipeline = Pipeline::new(mock, cfg).with_merger(spy.clone());

        let err = pipeline.run(&paragraphs(2, 20)).await.unwrap_err();
        assert!(matches!(err, PipelineError::AllChunksFailed { total: 2, .. }));
        assert_eq!(spy.merge_calls(), 0);
    }

    #[test]
    fn chunk_failure_message_is_one_based() {
        let err = PipelineError::ChunkFailed {
            index: 0,
            total: 3,
            source: ChunkAnalysisError::Timeout(Duration::from_secs(1)),
        };
        assert!(err.to_string().starts_with("Failed to analyze chunk 1 of 3"));
    }
}
