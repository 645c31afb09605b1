use thiserror::Error;

/// A structured model response that parsed but breaks an `Analysis` invariant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("sentimentScore {0} is outside [-1, 1]")]
    SentimentScoreOutOfRange(f64),

    #[error("pain point {index} has a blank topic")]
    BlankTopic { index: usize },

    #[error("pain point '{topic}' has count 0")]
    ZeroCount { topic: String },

    #[error("pain point '{topic}' sentiment {sentiment} is outside [-1, 1]")]
    SentimentOutOfRange { topic: String, sentiment: f64 },
}
