//! # Search Fan-out
//!
//! Runs every search of a plan concurrently and reports completions in the
//! order they finish. Individual failures only reduce the number of results.
//!
//! All searches live in one `FuturesUnordered` owned by the returned stream:
//! the first poll starts every request, and dropping the stream abandons
//! whatever is still in flight.

use futures::stream::{FuturesUnordered, Stream, StreamExt};
use tracing::{debug, info};

use crate::agents::Searcher;
use crate::models::SearchPlan;

// =============================================================================
// PROGRESS
// =============================================================================
/// One settled search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCompletion {
    /// Searches settled so far, including this one
    pub completed: usize,
    /// Searches launched
    pub total: usize,
    /// The summary, or `None` if this search failed
    pub summary: Option<String>,
}

impl SearchCompletion {
    /// Progress line in the "k/n completed" form.
    pub fn progress_message(&self) -> String {
        format!("Searching... {}/{} completed", self.completed, self.total)
    }
}

// =============================================================================
// FAN-OUT
// =============================================================================
/// Concurrent executor for a plan's searches.
///
/// Every search gets its own request; none waits for another. A search that
/// fails is reported with `summary: None` and is otherwise ignored, so the
/// number of summaries is the plan size minus the failures.
pub struct SearchFanOut {
    searcher: Searcher,
}

impl SearchFanOut {
    pub fn new(searcher: Searcher) -> Self {
        Self { searcher }
    }

    /// Stream one [`SearchCompletion`] per search, in completion order.
    ///
    /// The stream ends once every launched search has settled.
    pub fn progress<'a>(&'a self, plan: &'a SearchPlan) -> impl Stream<Item = SearchCompletion> + 'a {
        let total = plan.searches.len();
        let mut pending: FuturesUnordered<_> = plan
            .searches
            .iter()
            .map(|item| self.searcher.search(item))
            .collect();

        async_stream::stream! {
            info!(total, "Searching");
            let mut completed = 0;
            while let Some(summary) = pending.next().await {
                completed += 1;
                debug!(completed, total, ok = summary.is_some(), "Search settled");
                yield SearchCompletion { completed, total, summary };
            }
            info!(total, "Finished searching");
        }
    }

    /// Run every search and keep the successful summaries.
    ///
    /// Never fails; a plan whose searches all fail yields an empty vector.
    pub async fn search_all(&self, plan: &SearchPlan) -> Vec<String> {
        self.progress(plan)
            .filter_map(|completion| async move { completion.summary })
            .collect()
            .await
    }
}
