//! # Generation Capability
//!
//! Every agent in the pipeline (planner, searcher, writer) talks to an LLM
//! through the narrow [`Generator`] trait: one instructed request in, one text
//! response out. Backends are rig-core agents; tests substitute deterministic
//! fakes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use crate::config::{Config, Provider};
use crate::error::GenerationError;
use crate::tools::WebSearchTool;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaGenerator;
pub use openai::OpenAIGenerator;

/// Run an instructed agent once.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Send `prompt` to an agent configured with `preamble` and return its answer.
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError>;

    /// The model behind this generator, for logging.
    fn model_name(&self) -> &str;
}

/// Build the configured backend.
///
/// With a `search_tool` the agent may call it for up to
/// `config.search_max_turns` turns before answering.
pub fn build_generator(
    config: &Config,
    search_tool: Option<WebSearchTool>,
) -> Result<Arc<dyn Generator>, GenerationError> {
    let generator: Arc<dyn Generator> = match config.provider {
        Provider::Ollama => Arc::new(OllamaGenerator::new(config, search_tool)?),
        Provider::OpenAI => Arc::new(OpenAIGenerator::new(config, search_tool)?),
    };
    Ok(generator)
}

/// Parse a JSON object out of an LLM answer.
///
/// Models like to wrap JSON in markdown fences or add a sentence before it, so
/// this looks for the outermost `{ ... }` and parses that.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let trimmed = raw.trim();
    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate)
}
