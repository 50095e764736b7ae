//! # Planner Agent
//!
//! Turns a free-text query into a [`SearchPlan`]: a fixed number of diverse
//! searches, each with a rationale, plus the email address the user asked the
//! report to be sent to (if they gave one).

use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::error::ResearchError;
use crate::llm::{parse_json, Generator};
use crate::models::{SearchItem, SearchPlan};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
});

fn planner_preamble(how_many: usize) -> String {
    format!(
        r#"You are a helpful and detail-oriented research assistant.

Your task is two-fold:

1. Web search planning.
   Given a user query, produce exactly {how_many} distinct search terms that
   retrieve the most relevant and recent information. Cover different facets
   of the query and a variety of perspectives and sources. For every search
   term give a short reason explaining why it matters to the query.

2. Email intent.
   Decide whether the user wants the report emailed. If the query contains an
   email address for that purpose, return it exactly as written. Otherwise
   return null. Never invent an address.

Respond with a single JSON object and nothing else:
{{"searches": [{{"query": "...", "reason": "..."}}], "receiver_email": null}}"#
    )
}

/// Raw planner answer before validation.
#[derive(Debug, Deserialize)]
struct PlanResponse {
    searches: Vec<SearchItem>,
    #[serde(default)]
    receiver_email: Option<String>,
}

/// Plans the searches for a query.
pub struct Planner {
    generator: Arc<dyn Generator>,
    how_many: usize,
}

impl Planner {
    pub fn new(generator: Arc<dyn Generator>, how_many: usize) -> Self {
        Self { generator, how_many }
    }

    /// Number of searches the planner asks for.
    pub fn target_searches(&self) -> usize {
        self.how_many
    }

    /// Plan the searches for `query`.
    ///
    /// Any generation failure or malformed plan is fatal for the run.
    pub async fn plan(&self, query: &str) -> Result<SearchPlan, ResearchError> {
        info!(model = %self.generator.model_name(), "Planning searches");

        let raw = self
            .generator
            .generate(&planner_preamble(self.how_many), &format!("Query: {}", query))
            .await
            .map_err(|e| ResearchError::Planning(e.to_string()))?;

        debug!(response = %raw, "Planner response");

        let response: PlanResponse = parse_json(&raw)
            .map_err(|e| ResearchError::Planning(format!("invalid plan: {}", e)))?;

        let plan = self.validate(query, response)?;
        info!(
            searches = plan.searches.len(),
            email = plan.receiver_email.is_some(),
            "Will perform {} searches",
            plan.searches.len()
        );
        Ok(plan)
    }

    fn validate(&self, query: &str, response: PlanResponse) -> Result<SearchPlan, ResearchError> {
        let mut searches = Vec::with_capacity(response.searches.len());

        for (i, item) in response.searches.into_iter().enumerate() {
            let query_term = item.query.trim();
            let reason = item.reason.trim();
            if query_term.is_empty() {
                return Err(ResearchError::Planning(format!(
                    "search {} has an empty query",
                    i + 1
                )));
            }
            if reason.is_empty() {
                return Err(ResearchError::Planning(format!(
                    "search {} has no reason",
                    i + 1
                )));
            }
            searches.push(SearchItem::new(query_term, reason));
        }

        if searches.len() > self.how_many {
            debug!(
                planned = searches.len(),
                target = self.how_many,
                "Dropping surplus searches"
            );
            searches.truncate(self.how_many);
        } else if searches.len() < self.how_many {
            warn!(
                planned = searches.len(),
                target = self.how_many,
                "Planner returned fewer searches than requested"
            );
        }

        let plan = SearchPlan::new(searches);
        match response
            .receiver_email
            .as_deref()
            .and_then(|candidate| email_in_query(query, candidate))
        {
            Some(email) => Ok(plan.with_receiver(email)),
            None => Ok(plan),
        }
    }
}

/// Return the address from `query` matching `candidate`, as written in the query.
///
/// Placeholders like "None" and addresses that do not literally occur in the
/// query are rejected, so the planner can never make up a recipient.
fn email_in_query(query: &str, candidate: &str) -> Option<String> {
    let candidate = candidate
        .trim()
        .trim_start_matches("mailto:")
        .trim_matches(|c| c == '<' || c == '>');

    if candidate.is_empty() || !EMAIL_RE.is_match(candidate) {
        return None;
    }

    let found = EMAIL_RE
        .find_iter(query)
        .map(|m| m.as_str())
        .find(|addr| addr.eq_ignore_ascii_case(candidate));

    if found.is_none() {
        warn!(email = %candidate, "Ignoring email address not present in the query");
    }
    found.map(str::to_string)
}
