//! # Deep Research
//!
//! A multi-agent research pipeline built with the Rig framework. A query goes
//! through four agents in sequence:
//!
//! 1. **Planner** - decides which web searches to run and whether the user
//!    asked for the report by email
//! 2. **Searcher** - runs every planned search concurrently and summarizes
//!    each one
//! 3. **Writer** - turns the summaries into a long-form markdown report
//! 4. **Notifier** - emails the report when a recipient was given
//!
//! [`ResearchCoordinator::run`] drives the whole thing and streams
//! [`ProgressEvent`]s back to the caller.
//!
//! ```no_run
//! use deep_research::{Config, ProgressEvent, ResearchCoordinator};
//! use futures::StreamExt;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let events = ResearchCoordinator::from_config(&config)?.run("Latest advances in battery tech");
//! futures::pin_mut!(events);
//! while let Some(event) = events.next().await {
//!     if let ProgressEvent::FinalReport(report) = event? {
//!         println!("{}", report.markdown_report);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod config;
pub mod coordinator;
pub mod email;
pub mod error;
pub mod fanout;
pub mod llm;
pub mod models;
pub mod tools;

pub use agents::{Notifier, Planner, Searcher, Writer};
pub use config::{Config, Provider};
pub use coordinator::ResearchCoordinator;
pub use email::{EmailSender, OutgoingEmail, SendGridSender};
pub use error::{GenerationError, NotifyError, ResearchError};
pub use fanout::{SearchCompletion, SearchFanOut};
pub use llm::{build_generator, Generator};
pub use models::{ProgressEvent, Report, ResearchStage, SearchItem, SearchPlan};
pub use tools::WebSearchTool;
