//! Ollama generation backend via rig-core.

use async_trait::async_trait;
use rig::client::{CompletionClient, Nothing};
use rig::completion::Prompt;
use rig::providers::ollama;
use tracing::debug;

use super::Generator;
use crate::config::Config;
use crate::error::GenerationError;
use crate::tools::WebSearchTool;

/// Local LLM inference through an Ollama server.
pub struct OllamaGenerator {
    client: ollama::Client,
    model: String,
    temperature: f64,
    search_tool: Option<WebSearchTool>,
    max_turns: usize,
}

impl OllamaGenerator {
    /// Client for the server at `config.ollama_host`.
    pub fn new(config: &Config, search_tool: Option<WebSearchTool>) -> Result<Self, GenerationError> {
        let client = ollama::Client::builder()
            .api_key(Nothing)
            .base_url(&config.ollama_host)
            .build()
            .map_err(|e| GenerationError::Config(format!("Ollama client: {}", e)))?;

        debug!(host = %config.ollama_host, model = %config.model, "Ollama client ready");

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            search_tool,
            max_turns: config.search_max_turns,
        })
    }

    /// Base URL requests are sent to.
    pub fn host(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError> {
        let builder = self
            .client
            .agent(&self.model)
            .preamble(preamble)
            .temperature(self.temperature);

        let response = match &self.search_tool {
            Some(tool) => {
                let agent = builder.tool(tool.clone()).build();
                agent.prompt(prompt).multi_turn(self.max_turns).await
            }
            None => {
                let agent = builder.build();
                agent.prompt(prompt).await
            }
        }
        .map_err(|e| GenerationError::Prompt(e.to_string()))?;

        if response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
