//! # Search Agent
//!
//! Runs one planned search through a search-enabled agent and condenses the
//! findings into a short summary. Failures are expected here and never
//! propagate: a failed search simply has no result.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::Generator;
use crate::models::SearchItem;

const SEARCH_PREAMBLE: &str = r#"You are a research assistant. Given a search term, search the web for that term and produce a concise summary of the results.

Guidelines:
- Always use the web_search tool before answering.
- The summary must be 2-3 paragraphs and fewer than 300 words.
- Capture only the main points, in a succinct, telegraphic style.
- No need for complete sentences or polished grammar.
- The summary feeds into a larger report, so focus on the essence of the findings.
- Exclude fluff and any commentary not found in the results."#;

/// Executes single searches.
pub struct Searcher {
    generator: Arc<dyn Generator>,
    word_limit: usize,
}

impl Searcher {
    /// `generator` must be able to search the web (see `llm::build_generator`).
    pub fn new(generator: Arc<dyn Generator>, word_limit: usize) -> Self {
        Self {
            generator,
            word_limit,
        }
    }

    /// Search for `item`, returning its summary or `None` if anything went wrong.
    pub async fn search(&self, item: &SearchItem) -> Option<String> {
        let input = format!(
            "Search term: {}\nReason for searching: {}",
            item.query, item.reason
        );

        match self.generator.generate(SEARCH_PREAMBLE, &input).await {
            Ok(summary) if !summary.trim().is_empty() => {
                debug!(query = %item.query, "Search summary received");
                Some(truncate_words(summary.trim(), self.word_limit))
            }
            Ok(_) => {
                warn!(query = %item.query, "Search returned an empty summary");
                None
            }
            Err(e) => {
                warn!(query = %item.query, error = %e, "Search failed");
                None
            }
        }
    }
}

/// Cut `text` after `max_words` words, keeping the original whitespace.
fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = 0;
    let mut in_word = false;

    for (idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_words {
                return format!("{}...", text[..idx].trim_end());
            }
        }
    }

    text.to_string()
}
