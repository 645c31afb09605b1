pub mod error;
pub mod openai;
pub mod util;

pub use error::{AiError, Result};
pub use openai::{ChatOptions, OpenAi, StructuredOutput, DEEPSEEK_API_URL, OPENAI_API_URL};
pub use util::{strip_wrapping_quotes, truncate_to_char_boundary};
