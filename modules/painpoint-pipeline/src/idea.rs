use ai_client::{AiError, OpenAi};
use async_trait::async_trait;
use painpoint_common::IdeaAnalysis;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum IdeaResearchError {
    #[error("Idea is required")]
    EmptyIdea,

    #[error("idea research returned malformed output: {0}")]
    Malformed(String),

    #[error("idea research request failed: {0}")]
    Request(#[source] AiError),
}

impl From<AiError> for IdeaResearchError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::Parse(msg) => IdeaResearchError::Malformed(msg),
            other => IdeaResearchError::Request(other),
        }
    }
}

/// Market analysis for a single product idea.
#[async_trait]
pub trait IdeaResearcher: Send + Sync {
    async fn research(&self, idea: &str) -> Result<IdeaAnalysis, IdeaResearchError>;
}

const RESEARCH_SYSTEM_PROMPT: &str = "You are a market research expert specializing in technology products and startups. Provide detailed, data-driven analysis.";

fn build_research_prompt(idea: &str) -> String {
    format!(
        "Analyze this idea for micro-SaaS potential. Focus on finding a very specific niche problem \
that can be solved with a simple, focused solution.

Idea: {idea}

Analyze and provide:
1. Niche Market: Identify a specific subset of users or businesses with this pain point
2. Similar Solutions: Focus on small, successful micro-SaaS products (not large companies)
3. Market Potential: Estimate monthly recurring revenue potential for a micro-SaaS in this space
4. Key Features: List 3-5 core features that solve the specific pain point (keep it minimal)
5. Monetization: Suggest pricing model and target price point for a micro-SaaS solution

Put the realistic MRR estimate in `marketPotential.size` and the market trend in `marketPotential.growth`. \
Leave `url` null for a similar app when you are not sure of its address."
    )
}

/// [`IdeaResearcher`] backed by a chat model with strict structured output.
#[derive(Clone)]
pub struct LlmIdeaResearcher {
    ai: OpenAi,
}

impl LlmIdeaResearcher {
    pub fn new(ai: OpenAi) -> Self {
        Self { ai }
    }
}

#[async_trait]
impl IdeaResearcher for LlmIdeaResearcher {
    async fn research(&self, idea: &str) -> Result<IdeaAnalysis, IdeaResearchError> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(IdeaResearchError::EmptyIdea);
        }

        debug!(model = self.ai.model(), idea, "Researching idea");
        let analysis: IdeaAnalysis = self
            .ai
            .extract(RESEARCH_SYSTEM_PROMPT, build_research_prompt(idea))
            .await?;
        Ok(analysis)
    }
}
