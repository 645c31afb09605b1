// Test mocks for the analysis pipeline.
//
// One mock per trait boundary:
// - MockAnalyzer (ChunkAnalyzer): substring-matched chunk → result, with
//   scripted failures, delays, hangs and in-flight tracking
// - SpyMerger (AnalysisMerger): WeightedMerger that counts invocations
// - MockCommentExtractor, MockIdeaResearcher, MockTitleGenerator
//
// Plus helpers for building PainPoint / Analysis / IdeaAnalysis values.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use painpoint_common::{Analysis, IdeaAnalysis, MarketPotential, PainPoint, SimilarApp};

use crate::analyzer::{ChunkAnalysisError, ChunkAnalyzer};
use crate::comments::{CommentExtractionError, CommentExtractor};
use crate::idea::{IdeaResearchError, IdeaResearcher};
use crate::merge::{AnalysisMerger, WeightedMerger};
use crate::title::{TitleGenerationError, TitleGenerator};

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub fn pain_point(topic: &str, count: u32, sentiment: f64) -> PainPoint {
    PainPoint {
        topic: topic.to_string(),
        count,
        sentiment,
        examples: Vec::new(),
    }
}

pub fn analysis(
    pain_points: Vec<PainPoint>,
    ideas: Vec<&str>,
    sentiment_score: f64,
    total_comments: u32,
) -> Analysis {
    Analysis {
        pain_points,
        potential_ideas: ideas.into_iter().map(str::to_string).collect(),
        sentiment_score,
        total_comments,
    }
}

pub fn idea_analysis(app: &str) -> IdeaAnalysis {
    IdeaAnalysis {
        similar_apps: vec![SimilarApp {
            name: app.to_string(),
            description: format!("{app} does something close"),
            url: None,
        }],
        market_potential: MarketPotential {
            size: "$5k-10k MRR".to_string(),
            growth: "Growing".to_string(),
            opportunities: vec!["Underserved niche".to_string()],
        },
        key_differentiators: vec!["Simpler onboarding".to_string()],
        challenges: vec!["Distribution".to_string()],
    }
}

// ---------------------------------------------------------------------------
// MockAnalyzer
// ---------------------------------------------------------------------------

type ErrorFactory = Box<dyn Fn() -> ChunkAnalysisError + Send + Sync>;

/// Scriptable chunk analyzer. Rules match when the chunk contains the
/// registered substring and are checked in this order: hangs, scripted
/// failures, per-chunk failures, per-chunk results, the default result.
/// A chunk that matches nothing gets a `Malformed` error.
pub struct MockAnalyzer {
    results: Vec<(String, Analysis)>,
    failures: Vec<(String, ErrorFactory)>,
    hangs: Vec<String>,
    delays: Vec<(String, Duration)>,
    delay: Option<Duration>,
    default: Option<Analysis>,
    fail_first: Mutex<VecDeque<ErrorFactory>>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            hangs: Vec::new(),
            delays: Vec::new(),
            delay: None,
            default: None,
            fail_first: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn on_chunk(mut self, needle: &str, result: Analysis) -> Self {
        self.results.push((needle.to_string(), result));
        self
    }

    pub fn fail_on(
        mut self,
        needle: &str,
        error: impl Fn() -> ChunkAnalysisError + Send + Sync + 'static,
    ) -> Self {
        self.failures.push((needle.to_string(), Box::new(error)));
        self
    }

    /// The first `times` calls fail regardless of the chunk.
    pub fn fail_times(
        self,
        times: usize,
        error: impl Fn() -> ChunkAnalysisError + Send + Sync + Clone + 'static,
    ) -> Self {
        {
            let mut queue = self.fail_first.lock().unwrap();
            for _ in 0..times {
                queue.push_back(Box::new(error.clone()));
            }
        }
        self
    }

    /// Matching chunks never resolve.
    pub fn hang_on(mut self, needle: &str) -> Self {
        self.hangs.push(needle.to_string());
        self
    }

    pub fn delay_on(mut self, needle: &str, delay: Duration) -> Self {
        self.delays.push((needle.to_string(), delay));
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_default(mut self, result: Analysis) -> Self {
        self.default = Some(result);
        self
    }

    /// Chunks received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls that have started and not yet finished or been dropped.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn scripted(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError> {
        if let Some(error) = self.fail_first.lock().unwrap().pop_front() {
            return Err(error());
        }
        if let Some((_, error)) = self.failures.iter().find(|(n, _)| chunk.contains(n.as_str())) {
            return Err(error());
        }
        if let Some((_, result)) = self.results.iter().find(|(n, _)| chunk.contains(n.as_str())) {
            return Ok(result.clone());
        }
        self.default.clone().ok_or_else(|| {
            ChunkAnalysisError::Malformed(format!("MockAnalyzer: no result registered for {chunk:?}"))
        })
    }
}

/// Decrements the in-flight counter even when the call future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChunkAnalyzer for MockAnalyzer {
    async fn analyze_chunk(&self, chunk: &str) -> Result<Analysis, ChunkAnalysisError> {
        self.calls.lock().unwrap().push(chunk.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if self.hangs.iter().any(|n| chunk.contains(n.as_str())) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((_, delay)) = self.delays.iter().find(|(n, _)| chunk.contains(n.as_str())) {
            tokio::time::sleep(*delay).await;
        }

        self.scripted(chunk)
    }
}

// ---------------------------------------------------------------------------
// SpyMerger
// ---------------------------------------------------------------------------

/// [`WeightedMerger`] that records how often it ran.
#[derive(Default)]
pub struct SpyMerger {
    calls: AtomicUsize,
}

impl SpyMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisMerger for SpyMerger {
    fn merge(&self, partials: Vec<Analysis>) -> Option<Analysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        WeightedMerger.merge(partials)
    }
}

// ---------------------------------------------------------------------------
// Secondary flows
// ---------------------------------------------------------------------------

/// Returns a fixed comment list, or `NoComments` when built with `empty()`.
pub struct MockCommentExtractor {
    comments: Vec<String>,
    calls: Mutex<Vec<String>>,
}

impl MockCommentExtractor {
    pub fn new(comments: Vec<&str>) -> Self {
        Self {
            comments: comments.into_iter().map(str::to_string).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentExtractor for MockCommentExtractor {
    async fn extract_comments(&self, content: &str) -> Result<Vec<String>, CommentExtractionError> {
        self.calls.lock().unwrap().push(content.to_string());
        if content.trim().is_empty() {
            return Err(CommentExtractionError::EmptyInput);
        }
        if self.comments.is_empty() {
            return Err(CommentExtractionError::NoComments);
        }
        Ok(self.comments.clone())
    }
}

/// Returns the same [`IdeaAnalysis`] for every idea and records what it was asked.
pub struct MockIdeaResearcher {
    result: Option<IdeaAnalysis>,
    calls: Mutex<Vec<String>>,
}

impl MockIdeaResearcher {
    pub fn new(result: IdeaAnalysis) -> Self {
        Self {
            result: Some(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `Malformed`.
    pub fn failing() -> Self {
        Self {
            result: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdeaResearcher for MockIdeaResearcher {
    async fn research(&self, idea: &str) -> Result<IdeaAnalysis, IdeaResearchError> {
        self.calls.lock().unwrap().push(idea.to_string());
        if idea.trim().is_empty() {
            return Err(IdeaResearchError::EmptyIdea);
        }
        self.result
            .clone()
            .ok_or_else(|| IdeaResearchError::Malformed("MockIdeaResearcher: failing".into()))
    }
}

/// Returns a fixed title, or `Empty` when built with `failing()`.
pub struct MockTitleGenerator {
    title: Option<String>,
    calls: AtomicUsize,
}

impl MockTitleGenerator {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            title: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleGenerator for MockTitleGenerator {
    async fn generate_title(
        &self,
        _pain_points: &[PainPoint],
        _ideas: &[String],
    ) -> Result<String, TitleGenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.title.clone().ok_or(TitleGenerationError::Empty)
    }
}
