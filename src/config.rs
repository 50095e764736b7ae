//! # Configuration Module
//!
//! Loads the research pipeline's settings from environment variables (and a
//! local `.env` file). The resulting [`Config`] is passed explicitly to every
//! adapter at construction time; nothing reads the environment after startup.

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

/// Default number of searches the planner is asked for.
pub const HOW_MANY_SEARCHES: usize = 5;

/// Default upper bound for a single search summary, in words.
pub const SUMMARY_WORD_LIMIT: usize = 300;

// =============================================================================
// PROVIDER
// =============================================================================
/// Which LLM backend drives the agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    /// Local inference through an Ollama server
    #[default]
    Ollama,
    /// OpenAI API (or a compatible endpoint)
    OpenAI,
}

impl Provider {
    /// Model used when none is configured for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Ollama => "llama3.2",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    /// Environment variable holding the model name for this provider.
    fn model_env_var(&self) -> &'static str {
        match self {
            Provider::Ollama => "OLLAMA_MODEL",
            Provider::OpenAI => "OPENAI_MODEL",
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(Provider::Ollama),
            "openai" => Ok(Provider::OpenAI),
            other => anyhow::bail!("Unknown LLM provider '{}' (expected 'ollama' or 'openai')", other),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAI => write!(f, "openai"),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Main configuration for a research run.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM backend
    pub provider: Provider,

    /// Model name passed to the backend (e.g. "llama3.2", "gpt-4o-mini")
    pub model: String,

    /// Ollama server URL
    pub ollama_host: String,

    /// API key for the OpenAI backend
    pub openai_api_key: Option<String>,

    /// Temperature for LLM responses (0.0 = deterministic, 2.0 = very creative)
    pub temperature: f64,

    /// Maximum number of web results the search tool hands to the search agent
    pub max_search_results: usize,

    /// Number of searches the planner should produce
    pub how_many_searches: usize,

    /// Tool-call turns the search agent may take before it must answer
    pub search_max_turns: usize,

    /// Word cap for a single search summary
    pub summary_word_limit: usize,

    /// SendGrid API key; email delivery is disabled without it
    pub sendgrid_api_key: Option<String>,

    /// Verified sender address for outgoing reports
    pub sender_email: Option<String>,

    /// Log filter directive (same syntax as RUST_LOG)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::Ollama,
            model: Provider::Ollama.default_model().to_string(),
            ollama_host: "http://localhost:11434".to_string(),
            openai_api_key: None,
            temperature: 0.7,
            max_search_results: 5,
            how_many_searches: HOW_MANY_SEARCHES,
            search_max_turns: 5,
            summary_word_limit: SUMMARY_WORD_LIMIT,
            sendgrid_api_key: None,
            sender_email: None,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests feed it a map instead of
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("LLM_PROVIDER") {
            config.provider = val.parse().context("LLM_PROVIDER is invalid")?;
        }

        config.model = lookup(config.provider.model_env_var())
            .unwrap_or_else(|| config.provider.default_model().to_string());

        if let Some(val) = lookup("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }

        config.openai_api_key = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty());

        if let Some(val) = lookup("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Some(val) = lookup("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("HOW_MANY_SEARCHES") {
            config.how_many_searches = val
                .parse()
                .context("HOW_MANY_SEARCHES must be a valid positive integer")?;
        }

        if let Some(val) = lookup("SEARCH_MAX_TURNS") {
            config.search_max_turns = val
                .parse()
                .context("SEARCH_MAX_TURNS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("SUMMARY_WORD_LIMIT") {
            config.summary_word_limit = val
                .parse()
                .context("SUMMARY_WORD_LIMIT must be a valid positive integer")?;
        }

        config.sendgrid_api_key = lookup("SENDGRID_API_KEY").filter(|v| !v.trim().is_empty());
        config.sender_email = lookup("SENDER_EMAIL").filter(|v| !v.trim().is_empty());

        if let Some(val) = lookup("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Switch provider, resetting the model to that provider's default.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        if self.provider != provider {
            self.provider = provider;
            self.model = provider.default_model().to_string();
        }
        self
    }

    /// True when both SendGrid credentials are present.
    pub fn email_enabled(&self) -> bool {
        self.sendgrid_api_key.is_some() && self.sender_email.is_some()
    }

    /// Validate the configuration before any agent is built.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.how_many_searches == 0 {
            anyhow::bail!("HOW_MANY_SEARCHES must be at least 1");
        }

        if self.search_max_turns == 0 {
            anyhow::bail!("SEARCH_MAX_TURNS must be at least 1");
        }

        if self.summary_word_limit == 0 {
            anyhow::bail!("SUMMARY_WORD_LIMIT must be at least 1");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("Model name cannot be empty");
        }

        if self.provider == Provider::OpenAI && self.openai_api_key.is_none() {
            anyhow::bail!("OPENAI_API_KEY is required when LLM_PROVIDER=openai");
        }

        if self.sendgrid_api_key.is_some() && self.sender_email.is_none() {
            anyhow::bail!("SENDER_EMAIL is required when SENDGRID_API_KEY is set");
        }

        Ok(())
    }
}
