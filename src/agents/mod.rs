//! # Agents
//!
//! The four collaborators the research coordinator sequences:
//!
//! - [`Planner`] - query to search plan (+ optional recipient)
//! - [`Searcher`] - one search item to a bounded summary, or nothing
//! - [`Writer`] - query and summaries to the final report
//! - [`Notifier`] - report to exactly one email

pub mod notifier;
pub mod planner;
pub mod searcher;
pub mod writer;

pub use notifier::Notifier;
pub use planner::Planner;
pub use searcher::Searcher;
pub use writer::Writer;
