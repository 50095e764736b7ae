//! Deterministic fakes for the generation and email capabilities.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use deep_research::{
    EmailSender, GenerationError, Generator, Notifier, NotifyError, OutgoingEmail, Planner,
    ProgressEvent, ResearchCoordinator, ResearchError, Searcher, Writer,
};

pub const REPORT_JSON: &str = r##"{"short_summary": "Solid-state and sodium-ion cells lead 2025.", "markdown_report": "# Battery Tech 2025\n\n## Findings\n\nSolid-state cells entered pilot production.", "follow_up_questions": ["How fast will costs fall?"]}"##;

/// Five search items, with `email` spliced in as the raw JSON value.
pub fn plan_json(email: &str) -> String {
    let searches: Vec<String> = [
        "solid state batteries 2025",
        "sodium ion commercialization",
        "battery recycling breakthroughs",
        "lithium metal anodes",
        "grid storage costs 2025",
    ]
    .iter()
    .map(|term| format!(r#"{{"query": "{}", "reason": "covers {}"}}"#, term, term))
    .collect();
    format!(
        r#"{{"searches": [{}], "receiver_email": {}}}"#,
        searches.join(", "),
        email
    )
}

/// One fake answering for planner, searcher and writer, told apart by prompt.
pub struct FakeGenerator {
    plan: Result<String, String>,
    report: Result<String, String>,
    /// Search terms containing any of these fail
    failing_terms: Vec<String>,
    /// Per-search delay in milliseconds, keyed by a substring of the term
    delays: Vec<(String, u64)>,
    pub writer_inputs: Mutex<Vec<String>>,
    pub search_terms: Mutex<Vec<String>>,
    /// Searches that ran to the end of their delay
    pub settled_searches: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(plan: String) -> Self {
        Self {
            plan: Ok(plan),
            report: Ok(REPORT_JSON.to_string()),
            failing_terms: Vec::new(),
            delays: Vec::new(),
            writer_inputs: Mutex::new(Vec::new()),
            search_terms: Mutex::new(Vec::new()),
            settled_searches: AtomicUsize::new(0),
        }
    }

    pub fn failing_plan(mut self, reason: &str) -> Self {
        self.plan = Err(reason.to_string());
        self
    }

    pub fn failing_report(mut self, reason: &str) -> Self {
        self.report = Err(reason.to_string());
        self
    }

    pub fn failing_searches(mut self, terms: &[&str]) -> Self {
        self.failing_terms = terms.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_delay(mut self, term: &str, millis: u64) -> Self {
        self.delays.push((term.to_string(), millis));
        self
    }

    pub fn settled(&self) -> usize {
        self.settled_searches.load(Ordering::SeqCst)
    }

    pub fn writer_calls(&self) -> usize {
        self.writer_inputs.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn generate(&self, preamble: &str, prompt: &str) -> Result<String, GenerationError> {
        if prompt.starts_with("Query: ") {
            return self.plan.clone().map_err(GenerationError::Prompt);
        }

        if let Some(term) = prompt
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Search term: "))
        {
            self.search_terms.lock().unwrap().push(term.to_string());
            if let Some((_, millis)) = self.delays.iter().find(|(key, _)| term.contains(key.as_str())) {
                tokio::time::sleep(Duration::from_millis(*millis)).await;
            }
            self.settled_searches.fetch_add(1, Ordering::SeqCst);
            if self.failing_terms.iter().any(|t| t == "*" || term.contains(t.as_str())) {
                return Err(GenerationError::Prompt(format!("search outage for {}", term)));
            }
            return Ok(format!("Key points about {}.", term));
        }

        assert!(preamble.contains("senior researcher"), "unexpected agent call");
        self.writer_inputs.lock().unwrap().push(prompt.to_string());
        self.report.clone().map_err(GenerationError::Prompt)
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct Outbox {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

impl Outbox {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|e| e.to.clone()).collect()
    }
}

#[async_trait]
impl EmailSender for Outbox {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail {
            return Err(NotifyError::Http(503, "service unavailable".to_string()));
        }
        Ok(())
    }
}

/// Coordinator wired to `generator` for every agent, emailing into `outbox`.
pub fn coordinator(generator: Arc<FakeGenerator>, outbox: Option<Arc<Outbox>>) -> ResearchCoordinator {
    let coordinator = ResearchCoordinator::new(
        Planner::new(generator.clone(), 5),
        Searcher::new(generator.clone(), 300),
        Writer::new(generator),
    );
    match outbox {
        Some(outbox) => coordinator.with_notifier(Notifier::new(outbox)),
        None => coordinator,
    }
}

pub async fn run_to_end(
    coordinator: ResearchCoordinator,
    query: &str,
) -> Vec<Result<ProgressEvent, ResearchError>> {
    coordinator.run(query.to_string()).collect().await
}

/// Status messages of a run that had no errors, final report excluded.
pub fn messages(events: &[Result<ProgressEvent, ResearchError>]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.as_ref().ok())
        .filter_map(|e| e.message().map(str::to_string))
        .collect()
}

pub fn position(messages: &[String], prefix: &str) -> usize {
    messages
        .iter()
        .position(|m| m.starts_with(prefix))
        .unwrap_or_else(|| panic!("no message starting with {:?} in {:?}", prefix, messages))
}
