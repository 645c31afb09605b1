use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // AI providers
    pub openai_api_key: String,
    pub deepseek_api_key: String,
    pub deepseek_base_url: String,
    pub analysis_model: String,
    pub idea_model: String,
    pub filter_model: String,
    pub title_model: String,

    // Content sources
    pub jina_reader_url: String,
    pub hn_api_url: String,

    // Chunked analysis
    pub max_chunk_size: usize,
    pub max_concurrent_chunks: usize,
    pub chunk_timeout_secs: u64,
    pub chunk_max_attempts: u32,
    pub skip_failed_chunks: bool,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            deepseek_api_key: required_env("DEEPSEEK_API_KEY"),
            deepseek_base_url: env_or("DEEPSEEK_BASE_URL", "https://api.deepseek.com"),
            analysis_model: env_or("ANALYSIS_MODEL", "gpt-4o"),
            idea_model: env_or("IDEA_MODEL", "gpt-4o"),
            filter_model: env_or("FILTER_MODEL", "deepseek-chat"),
            title_model: env_or("TITLE_MODEL", "deepseek-chat"),
            jina_reader_url: env_or("JINA_READER_URL", "https://r.jina.ai"),
            hn_api_url: env_or("HN_API_URL", "https://hn.algolia.com/api/v1"),
            max_chunk_size: parsed_env("MAX_CHUNK_SIZE", 12_000),
            max_concurrent_chunks: parsed_env("MAX_CONCURRENT_CHUNKS", 4),
            chunk_timeout_secs: parsed_env("CHUNK_TIMEOUT_SECS", 120),
            chunk_max_attempts: parsed_env("CHUNK_MAX_ATTEMPTS", 1),
            skip_failed_chunks: parsed_env("SKIP_FAILED_CHUNKS", false),
            web_host: env_or("WEB_HOST", "0.0.0.0"),
            web_port: parsed_env("WEB_PORT", 3000),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_env<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => default,
    }
}

fn parse_setting<T: FromStr>(key: &str, raw: &str) -> T {
    raw.trim()
        .parse()
        .unwrap_or_else(|_| panic!("{key} has an invalid value: {raw:?}"))
}
