//! # Notifier
//!
//! Formats a finished report as an HTML email and hands it to the delivery
//! capability. One call sends exactly one email.

use pulldown_cmark::{html, Options, Parser};
use std::sync::Arc;
use tracing::info;

use crate::email::{EmailSender, OutgoingEmail};
use crate::error::NotifyError;
use crate::models::Report;

pub const DEFAULT_SUBJECT: &str = "Research Report on requested topic";

/// Emails reports.
pub struct Notifier {
    sender: Arc<dyn EmailSender>,
    subject: String,
}

impl Notifier {
    pub fn new(sender: Arc<dyn EmailSender>) -> Self {
        Self {
            sender,
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Send `report` to `recipient`.
    pub async fn notify(&self, recipient: &str, report: &Report) -> Result<(), NotifyError> {
        let recipient = recipient.trim();
        if recipient.is_empty() || !recipient.contains('@') {
            return Err(NotifyError::InvalidRecipient(recipient.to_string()));
        }

        let email = OutgoingEmail {
            to: recipient.to_string(),
            subject: self.subject.clone(),
            html_body: render_html(report),
        };

        info!(to = %recipient, "Writing email");
        self.sender.send(&email).await?;
        info!(to = %recipient, "Email sent");
        Ok(())
    }
}

/// Render the report's markdown body as a standalone HTML document.
pub fn render_html(report: &Report) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(&report.markdown_report, options);
    let mut body = String::with_capacity(report.markdown_report.len() * 3 / 2);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n\
         <body style=\"font-family: sans-serif; line-height: 1.5; max-width: 48em; margin: auto;\">\n\
         {}</body>\n</html>\n",
        body
    )
}
