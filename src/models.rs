//! # Data Model
//!
//! Transient values that flow through one research run: the plan, the report
//! and the progress events handed to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One planned web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchItem {
    /// The search term to use
    pub query: String,

    /// Why this search helps answer the overall query
    pub reason: String,
}

impl SearchItem {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

/// The planner's output: what to search and where (if anywhere) to send the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub searches: Vec<SearchItem>,

    /// Recipient taken verbatim from the query. `None` means no email is sent.
    pub receiver_email: Option<String>,
}

impl SearchPlan {
    pub fn new(searches: Vec<SearchItem>) -> Self {
        Self {
            searches,
            receiver_email: None,
        }
    }

    pub fn with_receiver(mut self, email: impl Into<String>) -> Self {
        self.receiver_email = Some(email.into());
        self
    }
}

/// The final research report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Two or three sentence overview of the findings
    pub short_summary: String,

    /// The full report in markdown
    pub markdown_report: String,

    /// Suggested topics to research further
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

/// Workflow states of a research run, in the only order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResearchStage {
    Start,
    Planning,
    Searching,
    Writing,
    Notifying,
    Done,
}

impl fmt::Display for ResearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResearchStage::Start => "start",
            ResearchStage::Planning => "planning",
            ResearchStage::Searching => "searching",
            ResearchStage::Writing => "writing",
            ResearchStage::Notifying => "notifying",
            ResearchStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// One item of the coordinator's progress stream.
///
/// `FinalReport` is emitted exactly once, as the last item of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Human-readable status update
    Status {
        stage: ResearchStage,
        message: String,
    },
    /// The finished report
    FinalReport(Report),
}

impl ProgressEvent {
    pub fn status(stage: ResearchStage, message: impl Into<String>) -> Self {
        ProgressEvent::Status {
            stage,
            message: message.into(),
        }
    }

    /// The status text, or `None` for the final report.
    pub fn message(&self) -> Option<&str> {
        match self {
            ProgressEvent::Status { message, .. } => Some(message),
            ProgressEvent::FinalReport(_) => None,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ProgressEvent::FinalReport(_))
    }
}
