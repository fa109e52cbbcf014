//! # Report Envelope
//!
//! Wire format of a queued report.
//!
//! ```json
//! { "filename": "sales-report-2025-05-19.pdf", "attachment": "JVBERi0xLjQK..." }
//! ```
//!
//! The attachment is the raw report bytes, standard base64 with padding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{QueueError, QueueResult};

/// A rendered report travelling through the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMessage {
    pub filename: String,

    /// base64 of the report bytes.
    pub attachment: String,
}

impl ReportMessage {
    /// Wraps report bytes for publishing.
    pub fn new(filename: impl Into<String>, content: &[u8]) -> Self {
        ReportMessage {
            filename: filename.into(),
            attachment: STANDARD.encode(content),
        }
    }

    /// Serializes to the JSON payload published on the queue.
    pub fn to_payload(&self) -> QueueResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| QueueError::Encode(e.to_string()))
    }

    /// Parses a consumed payload.
    pub fn from_payload(payload: &[u8]) -> QueueResult<Self> {
        let message: ReportMessage =
            serde_json::from_slice(payload).map_err(|e| QueueError::Malformed(e.to_string()))?;

        if message.filename.trim().is_empty() {
            return Err(QueueError::Malformed("empty filename".to_string()));
        }

        Ok(message)
    }

    /// Decodes the attachment back to report bytes.
    pub fn content(&self) -> QueueResult<Vec<u8>> {
        STANDARD
            .decode(self.attachment.as_bytes())
            .map_err(|e| QueueError::Malformed(format!("attachment is not base64: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let message = ReportMessage::new("sales-report-2025-05-19.pdf", b"%PDF-1.4\n");
        let payload = message.to_payload().unwrap();

        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(json["filename"], "sales-report-2025-05-19.pdf");
        assert_eq!(json["attachment"], "JVBERi0xLjQK");

        let parsed = ReportMessage::from_payload(&payload).unwrap();
        assert_eq!(parsed.content().unwrap(), b"%PDF-1.4\n");
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(matches!(
            ReportMessage::from_payload(b"not json"),
            Err(QueueError::Malformed(_))
        ));
        assert!(matches!(
            ReportMessage::from_payload(br#"{"filename":" ","attachment":""}"#),
            Err(QueueError::Malformed(_))
        ));

        let bad = ReportMessage::from_payload(br#"{"filename":"r.pdf","attachment":"@@@"}"#)
            .unwrap();
        assert!(matches!(bad.content(), Err(QueueError::Malformed(_))));
    }
}
