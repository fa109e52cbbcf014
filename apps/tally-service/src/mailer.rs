//! # Mailer
//!
//! Outbound mail for report delivery.
//!
//! ```text
//! ReportDistributor ──► Mailer::send(Mail)
//!                         ├── HttpMailer  POST <MAIL_RELAY_URL>  (JSON, base64 attachments)
//!                         └── LogMailer   tracing only (no relay configured)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Subject line of every report mail.
pub const REPORT_MAIL_SUBJECT: &str = "Daily Sales Report";

/// A file attached to a mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Attachment {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            content,
        }
    }
}

/// One outgoing mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

impl Mail {
    /// The report mail: fixed subject, HTML body, the report attached.
    pub fn report(
        from: impl Into<String>,
        to: impl Into<String>,
        attachment: Attachment,
        report_date: DateTime<Utc>,
    ) -> Self {
        Mail {
            from: from.into(),
            to: to.into(),
            subject: REPORT_MAIL_SUBJECT.to_string(),
            html: report_body(report_date),
            attachments: vec![attachment],
        }
    }
}

fn report_body(report_date: DateTime<Utc>) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; color: #333; padding: 20px;">
  <h2>{subject}</h2>
  <p><strong>Report Date:</strong> {date}</p>
  <p>The detailed sales report is attached as a PDF document.</p>
  <p>Regards,<br/>Tally Reports</p>
</div>"#,
        subject = REPORT_MAIL_SUBJECT,
        date = report_date.format("%Y-%m-%d %H:%M UTC"),
    )
}

/// Mail dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail transport failed: {0}")]
    Transport(String),

    #[error("Mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        MailError::Transport(err.to_string())
    }
}

/// Sends mail.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), MailError>;
}

// =============================================================================
// HTTP relay
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayAttachment<'a> {
    filename: &'a str,
    content_type: &'a str,
    /// base64
    content: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    attachments: Vec<RelayAttachment<'a>>,
}

/// Posts mail as JSON to an HTTP relay.
#[derive(Debug, Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
}

impl HttpMailer {
    pub fn new(url: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(HttpMailer {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        let body = RelayMessage {
            from: &mail.from,
            to: &mail.to,
            subject: &mail.subject,
            html: &mail.html,
            attachments: mail
                .attachments
                .iter()
                .map(|a| RelayAttachment {
                    filename: &a.filename,
                    content_type: &a.content_type,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let resp = self.client.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(to = %mail.to, subject = %mail.subject, "Mail sent via relay");
        Ok(())
    }
}

// =============================================================================
// Log-only
// =============================================================================

/// Logs mail instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), MailError> {
        for attachment in &mail.attachments {
            info!(
                to = %mail.to,
                subject = %mail.subject,
                filename = %attachment.filename,
                bytes = attachment.content.len(),
                "Mail relay not configured, logging mail"
            );
        }
        Ok(())
    }
}

// =============================================================================
// Test double
// =============================================================================

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Records every attempt; optionally fails all of them.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub fail: bool,
        attempts: AtomicUsize,
        sent: Mutex<Vec<Mail>>,
    }

    impl RecordingMailer {
        pub fn failing() -> Self {
            RecordingMailer {
                fail: true,
                ..Default::default()
            }
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        pub async fn sent(&self) -> Vec<Mail> {
            self.sent.lock().await.clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: Mail) -> Result<(), MailError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(MailError::Transport("relay down".to_string()));
            }
            self.sent.lock().await.push(mail);
            Ok(())
        }
    }
}
