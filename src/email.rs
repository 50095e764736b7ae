//! # Email Delivery
//!
//! The outbound email capability used by the notifier, plus its SendGrid
//! adapter (v3 `mail/send` API).

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::NotifyError;

const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A fully formatted message for exactly one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Something that can deliver an [`OutgoingEmail`].
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError>;
}

// =============================================================================
// SENDGRID
// =============================================================================
/// Sends mail through SendGrid from a verified sender address.
pub struct SendGridSender {
    api_key: String,
    from: String,
    api_base: String,
    client: Client,
    timeout: Duration,
}

impl SendGridSender {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            from: from.into(),
            api_base: SENDGRID_API_BASE.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Build from configuration; `None` when email delivery is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        match (&config.sendgrid_api_key, &config.sender_email) {
            (Some(key), Some(from)) => Some(Self::new(key.clone(), from.clone())),
            _ => None,
        }
    }

    /// Override the API base URL (used by tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

#[async_trait]
impl EmailSender for SendGridSender {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        let request = SendGridRequest {
            personalizations: [Personalization {
                to: [Address { email: &email.to }],
            }],
            from: Address { email: &self.from },
            subject: &email.subject,
            content: [Content {
                content_type: "text/html",
                value: &email.html_body,
            }],
        };

        debug!(to = %email.to, subject = %email.subject, "Sending email via SendGrid");

        let response = self
            .client
            .post(format!("{}/v3/mail/send", self.api_base))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout
                } else {
                    NotifyError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            info!(to = %email.to, status = status.as_u16(), "Email accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(NotifyError::Unauthorized),
            429 => Err(NotifyError::RateLimited),
            code => Err(NotifyError::Http(code, body)),
        }
    }
}
