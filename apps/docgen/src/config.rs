use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::Provider;

const DEFAULT_TIMEOUT_SECS: u64 = 120;
const MIN_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Fails at startup if the API credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub ai_api_key: String,
    pub ai_provider: Provider,
    pub ai_api_endpoint: String,
    pub ai_model: String,
    pub ai_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub public_base_url: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let ai_provider = match std::env::var("AI_PROVIDER") {
            Ok(raw) => raw
                .parse::<Provider>()
                .with_context(|| format!("AI_PROVIDER '{raw}' is not supported"))?,
            Err(_) => Provider::default(),
        };

        let ai_timeout_secs = match std::env::var("AI_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("AI_TIMEOUT_SECS must be a whole number of seconds")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            ai_api_key: require_env("AI_API_KEY")?,
            ai_api_endpoint: optional_env("AI_API_ENDPOINT")
                .unwrap_or_else(|| ai_provider.default_endpoint().to_string()),
            ai_model: optional_env("AI_MODEL")
                .unwrap_or_else(|| ai_provider.default_model().to_string()),
            ai_provider,
            ai_timeout_secs: clamp_timeout(ai_timeout_secs),
            output_dir: optional_env("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("generated_docs")),
            public_base_url: optional_env("PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8001".to_string())
                .trim_end_matches('/')
                .to_string(),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Generation latency is high and variable, so the request timeout stays in [30s, 120s].
pub fn clamp_timeout(secs: u64) -> u64 {
    secs.clamp(MIN_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_timeout_bounds() {
        assert_eq!(clamp_timeout(5), 30);
        assert_eq!(clamp_timeout(60), 60);
        assert_eq!(clamp_timeout(600), 120);
    }

    #[test]
    fn test_require_env_rejects_missing_variable() {
        let err = require_env("DOCGEN_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("DOCGEN_TEST_SURELY_UNSET_VARIABLE"));
    }
}
