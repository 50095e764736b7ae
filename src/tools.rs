//! # Tools Module
//!
//! The web-search capability handed to the search agent. Results come from
//! DuckDuckGo's HTML endpoint (no API key needed) and are exposed to the LLM
//! through rig's `Tool` trait.

use regex::Regex;
use rig::completion::ToolDefinition;
use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

// =============================================================================
// ERRORS
// =============================================================================
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to perform web search: {0}")]
    SearchFailed(String),

    #[error("Rate limited by search provider, please wait")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

// =============================================================================
// RESULTS
// =============================================================================
/// A single web hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

// =============================================================================
// WEB SEARCH TOOL
// =============================================================================
/// DuckDuckGo-backed web search, usable directly or as a rig tool.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    client: reqwest::Client,
    max_results: usize,
    endpoint: String,
}

impl WebSearchTool {
    /// Create a search tool returning at most `max_results` hits per query.
    pub fn new(max_results: usize) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_results,
            endpoint: SEARCH_ENDPOINT.to_string(),
        })
    }

    /// Point the tool at a different HTML endpoint (used by tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run one web search.
    pub async fn search(&self, query: &str) -> Result<Vec<WebHit>, SearchError> {
        info!(query = %query, "Performing web search");

        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query));
        debug!(url = %url, "Fetching search results");

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SearchError::RateLimited);
        }
        if !status.is_success() {
            return Err(SearchError::SearchFailed(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        let hits = parse_results(&body, self.max_results);

        if hits.is_empty() {
            warn!(query = %query, "No search results found");
        } else {
            info!(query = %query, count = hits.len(), "Search completed");
        }

        Ok(hits)
    }
}

/// Extract hits from a DuckDuckGo HTML results page.
///
/// Each organic result starts with a `result__a` anchor whose href is a
/// redirect carrying the real target in its `uddg` parameter; the matching
/// `result__snippet` follows before the next result.
fn parse_results(html: &str, max_results: usize) -> Vec<WebHit> {
    let mut hits = Vec::new();
    let mut seen = HashSet::new();

    for block in html.split("class=\"result__a\"").skip(1) {
        if hits.len() >= max_results {
            break;
        }

        let Some(url) = extract_href(block).and_then(|href| resolve_target(&href)) else {
            continue;
        };
        if url.contains("duckduckgo.com") || !seen.insert(url.clone()) {
            continue;
        }

        let title = anchor_text(block)
            .filter(|t| !t.is_empty())
            .or_else(|| extract_domain(&url))
            .unwrap_or_else(|| "Result".to_string());

        let snippet = block
            .split_once("class=\"result__snippet\"")
            .and_then(|(_, rest)| anchor_text(rest))
            .unwrap_or_default();

        hits.push(WebHit { title, url, snippet });
    }

    hits
}

fn extract_href(block: &str) -> Option<String> {
    let start = block.find("href=\"")? + "href=\"".len();
    let end = block[start..].find('"')?;
    Some(block[start..start + end].replace("&amp;", "&"))
}

/// Turn a result href into the page it points at.
fn resolve_target(href: &str) -> Option<String> {
    if let Some((_, rest)) = href.split_once("uddg=") {
        let encoded = rest.split('&').next()?;
        return urlencoding::decode(encoded).ok().map(|u| u.into_owned());
    }
    if let Some(stripped) = href.strip_prefix("//") {
        return Some(format!("https://{}", stripped));
    }
    href.starts_with("http").then(|| href.to_string())
}

/// Text of the first anchor in `fragment`, tags stripped and entities decoded.
fn anchor_text(fragment: &str) -> Option<String> {
    let start = fragment.find('>')? + 1;
    let end = fragment[start..].find("</a>")?;
    let text = TAG_RE.replace_all(&fragment[start..start + end], "");
    Some(decode_entities(text.trim()))
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

/// Extract the domain name from a URL.
fn extract_domain(url: &str) -> Option<String> {
    url.split("//")
        .nth(1)?
        .split('/')
        .next()
        .map(|s| s.to_string())
}

/// Render hits as markdown for the agent.
pub fn format_hits(query: &str, hits: &[WebHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for: {}", query);
    }

    let body = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. **{}**\n   URL: {}\n   {}\n",
                i + 1,
                hit.title,
                hit.url,
                hit.snippet
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("## Search Results for: {}\n\n{}", query, body)
}

// =============================================================================
// RIG TOOL TRAIT IMPLEMENTATION
// =============================================================================
/// Input arguments for the search tool.
#[derive(Debug, Deserialize, Serialize)]
pub struct SearchArgs {
    /// The search query to execute
    pub query: String,
}

impl Tool for WebSearchTool {
    const NAME: &'static str = "web_search";

    type Args = SearchArgs;
    type Output = String;
    type Error = SearchError;

    async fn definition(&self, _prompt: String) -> ToolDefinition {
        ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Search the web for current information. Returns titles, URLs and snippets of matching pages.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search term"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        let hits = self.search(&args.query).await?;
        Ok(format_hits(&args.query, &hits))
    }
}
