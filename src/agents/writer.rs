//! # Writer Agent
//!
//! Synthesizes the final long-form report from the original query and the
//! collected search summaries.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::ResearchError;
use crate::llm::{parse_json, Generator};
use crate::models::Report;

const WRITER_PREAMBLE: &str = r#"You are a senior researcher tasked with writing a cohesive report for a research query. You will be provided with the original query and research summaries prepared by an assistant.

Your responsibilities:
1. Draft an outline that shows how the report will be structured.
2. Expand the outline into a full report that integrates the findings.
3. Write in markdown with proper headings, lists and emphasis where appropriate.

The report should be extensive and detailed, the equivalent of 5-10 pages (at least 1000 words).
If no research summaries are available, say so in the report and rely on what you know, flagging any uncertainty.

Respond with a single JSON object and nothing else:
{"short_summary": "2-3 sentence summary of the findings", "markdown_report": "the full report", "follow_up_questions": ["..."]}"#;

/// Writes research reports.
pub struct Writer {
    generator: Arc<dyn Generator>,
}

impl Writer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    /// Write the report for `query` from the search `results` (possibly none).
    pub async fn write(&self, query: &str, results: &[String]) -> Result<Report, ResearchError> {
        if query.trim().is_empty() {
            return Err(ResearchError::EmptyQuery);
        }

        info!(
            model = %self.generator.model_name(),
            sources = results.len(),
            "Thinking about report"
        );

        let raw = self
            .generator
            .generate(WRITER_PREAMBLE, &writer_input(query, results))
            .await
            .map_err(|e| ResearchError::Writing(e.to_string()))?;

        let mut report: Report = parse_json(&raw)
            .map_err(|e| ResearchError::Writing(format!("invalid report: {}", e)))?;

        if report.markdown_report.trim().is_empty() {
            return Err(ResearchError::Writing("report body is empty".to_string()));
        }

        report.follow_up_questions.retain(|q| !q.trim().is_empty());

        debug!(
            words = report.markdown_report.split_whitespace().count(),
            follow_ups = report.follow_up_questions.len(),
            "Finished writing report"
        );
        Ok(report)
    }
}

fn writer_input(query: &str, results: &[String]) -> String {
    if results.is_empty() {
        return format!(
            "Original query: {}\n\nSummarized search results: none (every search failed)",
            query
        );
    }

    let summaries = results
        .iter()
        .enumerate()
        .map(|(i, summary)| format!("### Result {}\n{}", i + 1, summary))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Original query: {}\n\nSummarized search results:\n\n{}",
        query, summaries
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use async_trait::async_trait;

    struct CannedGenerator(Result<String, String>);

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(&self, _preamble: &str, _prompt: &str) -> Result<String, GenerationError> {
            self.0.clone().map_err(GenerationError::Prompt)
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    fn writer(answer: Result<&str, &str>) -> Writer {
        Writer::new(Arc::new(CannedGenerator(
            answer.map(str::to_string).map_err(str::to_string),
        )))
    }

    #[tokio::test]
    async fn test_write_parses_report() {
        let report = writer(Ok(
            r##"{"short_summary": "Batteries improved.", "markdown_report": "# Batteries\n\nBody", "follow_up_questions": ["What next?", " "]}"##,
        ))
        .write("battery tech", &["summary one".to_string()])
        .await
        .unwrap();

        assert_eq!(report.short_summary, "Batteries improved.");
        assert!(report.markdown_report.starts_with("# Batteries"));
        assert_eq!(report.follow_up_questions, vec!["What next?".to_string()]);
    }

    #[tokio::test]
    async fn test_write_rejects_empty_body() {
        let result = writer(Ok(r#"{"short_summary": "s", "markdown_report": ""}"#))
            .write("topic", &[])
            .await;
        assert!(matches!(result, Err(ResearchError::Writing(_))));
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let result = writer(Err("model overloaded")).write("topic", &[]).await;
        assert!(matches!(result, Err(ResearchError::Writing(_))));
    }

    #[tokio::test]
    async fn test_write_requires_query() {
        let result = writer(Ok("{}")).write("  ", &[]).await;
        assert!(matches!(result, Err(ResearchError::EmptyQuery)));
    }

    #[test]
    fn test_writer_input_without_results() {
        let input = writer_input("topic", &[]);
        assert!(input.contains("Original query: topic"));
        assert!(input.contains("none"));
    }

    #[test]
    fn test_writer_input_numbers_results() {
        let input = writer_input("topic", &["a".to_string(), "b".to_string()]);
        assert!(input.contains("### Result 1\na"));
        assert!(input.contains("### Result 2\nb"));
    }
}
