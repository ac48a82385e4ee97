use anyhow::{Result, anyhow};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub timeout: Duration,
}

impl Config {
    /// Reads configuration from the process environment. A missing API key
    /// is an error here, before any network client is built.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENROUTER_API_KEY not set. Export it and retry."))?;

        let base_url = env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let embedding_model = env::var("MINIRAG_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        let chat_model = env::var("MINIRAG_CHAT_MODEL")
            .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string());

        Ok(Config {
            api_key,
            base_url,
            embedding_model,
            chat_model,
            timeout: Duration::from_secs(15),
        })
    }
}
