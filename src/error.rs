//! Error types for the research pipeline.
//!
//! Only planning and writing failures abort a run. Search failures never
//! surface as errors (the searcher turns them into absent results) and
//! notification failures are reported as status events.

use thiserror::Error;

/// Fatal errors that end a research run.
#[derive(Error, Debug)]
pub enum ResearchError {
    #[error("Research query must not be empty")]
    EmptyQuery,

    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Writing failed: {0}")]
    Writing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A single failed call to a generation backend.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Agent execution failed: {0}")]
    Prompt(String),

    #[error("Backend returned an empty response")]
    EmptyResponse,

    #[error("Backend configuration error: {0}")]
    Config(String),
}

/// Email delivery failures.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("email delivery is not configured")]
    NotConfigured,

    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("unauthorized - check SENDGRID_API_KEY")]
    Unauthorized,

    #[error("rate limited by email provider")]
    RateLimited,

    #[error("email provider returned HTTP {0}: {1}")]
    Http(u16, String),
}
