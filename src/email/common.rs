//! Common structures and utilities for email processing
use chrono::{DateTime, Utc};
use log::{debug, warn};
use mail_parser::{MessageParser, PartType};

use crate::error::MailError;

/// A decoded notification email.
#[derive(Debug, Clone)]
pub struct MailMessage {
    /// Mailbox UID of the message.
    pub position: u32,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub body: String,
}

impl MailMessage {
    /// Case-insensitive substring match against the subject.
    pub fn subject_contains(&self, phrase: &str) -> bool {
        self.subject.to_lowercase().contains(&phrase.to_lowercase())
    }
}

/// Decodes a raw RFC 822 message.
///
/// The body is made of the `text/plain` parts, or of the `text/html` parts when
/// there is no plain text alternative.
pub fn decode_message(position: u32, raw: &[u8]) -> Result<MailMessage, MailError> {
    let parsed = MessageParser::default()
        .parse(raw)
        .ok_or_else(|| MailError::Message {
            position,
            reason: "unparseable MIME structure".to_string(),
        })?;

    let date = parsed
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .ok_or_else(|| MailError::Message {
            position,
            reason: "missing or invalid Date header".to_string(),
        })?;

    let subject = parsed.subject().unwrap_or_default().to_string();

    let mut plain = String::new();
    let mut html = String::new();
    for part in &parsed.parts {
        match &part.body {
            PartType::Text(text) => plain.push_str(text),
            PartType::Html(text) => html.push_str(text),
            _ => {}
        }
    }

    let body = if plain.trim().is_empty() { html } else { plain };
    if body.is_empty() {
        warn!("Message {} has no text body", position);
    }

    debug!("Decoded message {}: '{}' ({}), body {} chars", position, subject, date, body.len());

    Ok(MailMessage {
        position,
        subject,
        date,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALTERNATIVE: &str = "From: Vinted <no-reply@vinted.pl>\r\n\
Subject: =?UTF-8?Q?Tw=C3=B3j_przedmiot_zosta=C5=82_sprzedany?=\r\n\
Date: Tue, 02 Jan 2024 10:15:00 +0100\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Mew ex (MEW 151/165)\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>Mew ex (MEW 151/165)</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_decode_prefers_plain_text() {
        let message = decode_message(7, ALTERNATIVE.as_bytes()).unwrap();

        assert_eq!(message.position, 7);
        assert_eq!(message.subject, "Twój przedmiot został sprzedany");
        assert_eq!(message.date.to_rfc3339(), "2024-01-02T09:15:00+00:00");
        assert!(message.body.contains("Mew ex (MEW 151/165)"));
        assert!(!message.body.contains("<p>"));
    }

    #[test]
    fn test_decode_html_only() {
        let raw = "Subject: Sold\r\n\
Date: Tue, 02 Jan 2024 10:15:00 +0000\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<b>Pikachu (SVI 25)</b>\r\n";

        let message = decode_message(1, raw.as_bytes()).unwrap();

        assert!(message.body.contains("<b>Pikachu (SVI 25)</b>"));
    }

    #[test]
    fn test_missing_date_is_message_error() {
        let raw = "Subject: Sold\r\n\r\nPikachu (SVI 25)\r\n";

        match decode_message(3, raw.as_bytes()) {
            Err(MailError::Message { position, .. }) => assert_eq!(position, 3),
            other => panic!("expected a message error, got {:?}", other),
        }
    }

    #[test]
    fn test_subject_contains_ignores_case() {
        let message = MailMessage {
            position: 1,
            subject: "Twój przedmiot został SPRZEDANY".to_string(),
            date: Utc::now(),
            body: String::new(),
        };

        assert!(message.subject_contains("twój przedmiot został sprzedany"));
        assert!(!message.subject_contains("zamówienie"));
    }
}
