pub mod analyzer;
pub mod chunker;
pub mod comments;
pub mod idea;
pub mod merge;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod title;

pub use analyzer::{ChunkAnalysisError, ChunkAnalyzer, LlmChunkAnalyzer, RetryingAnalyzer};
pub use chunker::{split_into_chunks, DEFAULT_MAX_CHUNK_SIZE};
pub use comments::{CommentExtractionError, CommentExtractor, LlmCommentExtractor};
pub use idea::{IdeaResearchError, IdeaResearcher, LlmIdeaResearcher};
pub use merge::{merge_analyses, AnalysisMerger, WeightedMerger};
pub use pipeline::{FailurePolicy, Pipeline, PipelineConfig, PipelineError};
pub use title::{LlmTitleGenerator, TitleGenerationError, TitleGenerator};
