//! Notification channels for new job postings: chat webhook, SMTP email and a log-only sink.
//!
//! Every channel makes exactly one delivery attempt per call and reports the outcome; the
//! caller decides what a failure means for its seen-set.

use std::time::Duration;

use async_trait::async_trait;
use jobwatch_core::JobRecord;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub const CRATE_NAME: &str = "jobwatch-notify";

/// Discord rejects message content longer than this many characters.
pub const CHAT_MESSAGE_LIMIT: usize = 2000;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned http status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("invalid email address: {0}")]
    Address(String),
    #[error("building email message: {0}")]
    Message(String),
    #[error("smtp send failed: {0}")]
    Transport(String),
    #[error("invalid notifier configuration: {0}")]
    Config(String),
}

/// Delivers one record to an external channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> &str;

    async fn send(&self, record: &JobRecord) -> Result<(), NotifyError>;
}

fn found_at(record: &JobRecord) -> String {
    record.discovered_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn posted_at(record: &JobRecord) -> String {
    record
        .posted_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

pub fn format_chat_message(record: &JobRecord) -> String {
    let message = format!(
        "-----\nNew job at {}:\n  Job Title: {}\n  Location: {}\n  Link: {}\n  Found At: {}\n  Posted At: {}\n-----",
        record.company,
        record.title,
        record.location,
        record.url,
        found_at(record),
        posted_at(record),
    );
    truncate_chars(message, CHAT_MESSAGE_LIMIT)
}

fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

pub fn email_subject(record: &JobRecord) -> String {
    format!("New Job at {}: {}", record.company, record.title)
}

pub fn email_body(record: &JobRecord) -> String {
    format!(
        "Company: {}\nJob Title: {}\nLocation: {}\nLink: {}\nFound At: {}\nPosted At: {}\n",
        record.company,
        record.title,
        record.location,
        record.url,
        found_at(record),
        posted_at(record),
    )
}

#[derive(Debug)]
pub struct WebhookConfig {
    pub url: SecretString,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts `{"content": ...}` to a Discord-compatible webhook.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: SecretString,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        if config.url.expose_secret().trim().is_empty() {
            return Err(NotifyError::Config("webhook url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("building webhook client: {e}")))?;
        Ok(Self {
            client,
            url: config.url,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> &str {
        "webhook"
    }

    async fn send(&self, record: &JobRecord) -> Result<(), NotifyError> {
        let content = format_chat_message(record);
        let resp = self
            .client
            .post(self.url.expose_secret())
            .json(&WebhookPayload { content: &content })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), identifier = %record.identifier, "webhook accepted message");
        Ok(())
    }
}

#[derive(Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    pub to_address: String,
    /// STARTTLS on a plain connection instead of implicit TLS.
    pub starttls: bool,
}

/// Sends one plain-text email per record through an authenticated SMTP relay.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    #[tracing::instrument(
        name = "email_notifier_new",
        skip(config),
        fields(host = %config.host, port = config.port, starttls = config.starttls)
    )]
    pub fn new(config: SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {e}", config.from_address)))?;
        let to: Mailbox = config
            .to_address
            .parse()
            .map_err(|e| NotifyError::Address(format!("{}: {e}", config.to_address)))?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        }
        .map_err(|e| NotifyError::Config(format!("smtp relay {}: {e}", config.host)))?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = builder.port(config.port).credentials(credentials).build();

        debug!("SMTP notifier initialized");
        Ok(Self { transport, from, to })
    }

    pub fn build_message(&self, record: &JobRecord) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(email_subject(record))
            .header(ContentType::TEXT_PLAIN)
            .body(email_body(record))
            .map_err(|e| NotifyError::Message(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &str {
        "email"
    }

    async fn send(&self, record: &JobRecord) -> Result<(), NotifyError> {
        let message = self.build_message(record)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        debug!(identifier = %record.identifier, "email sent");
        Ok(())
    }
}

/// Writes records to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn channel(&self) -> &str {
        "log"
    }

    async fn send(&self, record: &JobRecord) -> Result<(), NotifyError> {
        info!(
            company = %record.company,
            title = %record.title,
            location = %record.location,
            url = %record.url,
            "dry run: would notify"
        );
        Ok(())
    }
}
