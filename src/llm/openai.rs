//! OpenAI generation backend via rig-core.

use async_trait::async_trait;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;

use super::Generator;
use crate::config::Config;
use crate::error::GenerationError;
use crate::tools::WebSearchTool;

/// OpenAI API backend. Requires `OPENAI_API_KEY` in the configuration.
pub struct OpenAIGenerator {
    client: openai::Client,
    model: String,
    temperature: f64,
    search_tool: Option<WebSearchTool>,
    max_turns: usize,
}

impl OpenAIGenerator {
    pub fn new(config: &Config, search_tool: Option<WebSearchTool>) -> Result<Self, GenerationError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or_else(|| GenerationError::Config("OPENAI_API_KEY is not set".to_string()))?;

        let client = openai::Client::builder()
            .api_key(&api_key)
            .build()
            .map_err(|e| GenerationError::Config(format!("OpenAI client: {}", e)))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            temperature: config.temperature,
            search_tool,
            max_turns: config.search_max_turns,
        })
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
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
        .map_err(|e| GenerationError::Prompt(format!("OpenAI completion failed: {}", e)))?;

        if response.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
