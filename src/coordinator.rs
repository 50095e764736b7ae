//! # Research Coordinator
//!
//! Sequences one research run: plan, fan out the searches, write the report,
//! optionally email it. Progress is delivered as a lazy stream of
//! [`ProgressEvent`]s ending with the [`ProgressEvent::FinalReport`].
//!
//! ```text
//! Start -> Planning -> Searching -> Writing -> (Notifying) -> Done
//! ```
//!
//! Only planning and writing failures end the run early; they are yielded as
//! the stream's single `Err` item. Failed searches shrink the result set and a
//! failed email is reported as a status message.

use futures::stream::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::agents::{Notifier, Planner, Searcher, Writer};
use crate::config::Config;
use crate::email::{EmailSender, SendGridSender};
use crate::error::{NotifyError, ResearchError};
use crate::fanout::SearchFanOut;
use crate::llm::build_generator;
use crate::models::{ProgressEvent, ResearchStage};
use crate::tools::WebSearchTool;

// =============================================================================
// COORDINATOR
// =============================================================================
/// Runs a single research query end to end.
///
/// Owns one planner, one search fan-out, one writer and, when email delivery
/// is configured, one notifier. [`run`](Self::run) consumes the coordinator,
/// so every query gets a fresh instance.
pub struct ResearchCoordinator {
    planner: Planner,
    fan_out: SearchFanOut,
    writer: Writer,
    notifier: Option<Notifier>,
}

impl ResearchCoordinator {
    /// Assemble a coordinator from its collaborators. Email is disabled
    /// until [`with_notifier`](Self::with_notifier) is called.
    pub fn new(planner: Planner, searcher: Searcher, writer: Writer) -> Self {
        Self {
            planner,
            fan_out: SearchFanOut::new(searcher),
            writer,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the production pipeline: rig-core agents for planning, searching
    /// and writing, and SendGrid delivery when it is configured.
    pub fn from_config(config: &Config) -> Result<Self, ResearchError> {
        let search_tool = WebSearchTool::new(config.max_search_results)
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        let text_generator =
            build_generator(config, None).map_err(|e| ResearchError::Config(e.to_string()))?;
        let search_generator = build_generator(config, Some(search_tool))
            .map_err(|e| ResearchError::Config(e.to_string()))?;

        let coordinator = Self::new(
            Planner::new(text_generator.clone(), config.how_many_searches),
            Searcher::new(search_generator, config.summary_word_limit),
            Writer::new(text_generator),
        );

        match SendGridSender::from_config(config) {
            Some(sender) => {
                let sender: Arc<dyn EmailSender> = Arc::new(sender);
                Ok(coordinator.with_notifier(Notifier::new(sender)))
            }
            None => {
                info!("SendGrid not configured, email delivery disabled");
                Ok(coordinator)
            }
        }
    }

    /// Research `query`, streaming progress as it happens.
    ///
    /// Nothing runs until the stream is polled. Dropping the stream cancels
    /// the run, including any searches still in flight.
    pub fn run(
        self,
        query: impl Into<String>,
    ) -> impl Stream<Item = Result<ProgressEvent, ResearchError>> {
        let query = query.into();
        let run_id = Uuid::new_v4();
        let span = run_span(&run_id);

        async_stream::try_stream! {
            // =================================================================
            // PLANNING
            // =================================================================
            check_query(&query)?;
            span.in_scope(|| info!(query = %query, "Starting research"));

            yield ProgressEvent::status(
                ResearchStage::Planning,
                format!("Starting research (run {})...", run_id),
            );
            let plan = self.planner.plan(&query).instrument(span.clone()).await?;

            // =================================================================
            // SEARCHING
            // =================================================================
            // One status per settled search, in completion order. Failed
            // searches still count towards k/n.
            yield ProgressEvent::status(
                ResearchStage::Searching,
                "Searches planned, starting to search...",
            );
            let mut results = Vec::with_capacity(plan.searches.len());
            {
                let progress = self.fan_out.progress(&plan);
                futures::pin_mut!(progress);
                while let Some(completion) = progress.next().instrument(span.clone()).await {
                    let message = completion.progress_message();
                    if let Some(summary) = completion.summary {
                        results.push(summary);
                    }
                    yield ProgressEvent::status(ResearchStage::Searching, message);
                }
            }
            if results.len() < plan.searches.len() {
                span.in_scope(|| {
                    warn!(
                        succeeded = results.len(),
                        planned = plan.searches.len(),
                        "Some searches failed"
                    )
                });
            }

            // =================================================================
            // WRITING
            // =================================================================
            yield ProgressEvent::status(
                ResearchStage::Writing,
                "Searches complete, writing report...",
            );
            let report = self.writer.write(&query, &results).instrument(span.clone()).await?;

            // =================================================================
            // NOTIFYING
            // =================================================================
            // A delivery failure only changes the final status message; the
            // report is yielded either way.
            match plan.receiver_email.as_deref() {
                Some(recipient) => {
                    yield ProgressEvent::status(
                        ResearchStage::Notifying,
                        "Report written, sending email...",
                    );
                    let outcome = match &self.notifier {
                        Some(notifier) => {
                            notifier
                                .notify(recipient, &report)
                                .instrument(span.clone())
                                .await
                        }
                        None => Err(NotifyError::NotConfigured),
                    };
                    match outcome {
                        Ok(()) => {
                            yield ProgressEvent::status(
                                ResearchStage::Done,
                                "Email sent, research complete",
                            );
                        }
                        Err(e) => {
                            span.in_scope(|| warn!(error = %e, "Email delivery failed"));
                            yield ProgressEvent::status(
                                ResearchStage::Done,
                                format!("Could not send email: {}", e),
                            );
                        }
                    }
                }
                None => {
                    yield ProgressEvent::status(ResearchStage::Done, "Report written");
                    yield ProgressEvent::status(
                        ResearchStage::Done,
                        "Skipping email send, as not required...",
                    );
                }
            }

            span.in_scope(|| info!(sources = results.len(), "Research complete"));
            yield ProgressEvent::FinalReport(report);
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================
fn check_query(query: &str) -> Result<(), ResearchError> {
    if query.trim().is_empty() {
        return Err(ResearchError::EmptyQuery);
    }
    Ok(())
}

/// The span every log line of one run is recorded under.
fn run_span(run_id: &Uuid) -> Span {
    info_span!("research", run_id = %run_id)
}
