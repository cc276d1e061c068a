use bizcard_core::{ExtractedRecord, Locale, SmtpSettings};
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Invalid email address '{address}': {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Failed to render record: {0}")]
    Render(#[from] bizcard_export::ExportError),
}

fn mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address.parse().map_err(|source| EmailError::Address {
        address: address.to_string(),
        source,
    })
}

pub fn subject(locale: Locale) -> &'static str {
    match locale {
        Locale::Italian => "Dati biglietto da visita",
        Locale::English => "Business card data",
    }
}

/// Plain-text message whose body is the record as labelled JSON.
pub fn build_message(settings: &SmtpSettings, record: &ExtractedRecord) -> Result<Message, EmailError> {
    let body = bizcard_export::to_json(&record.to_row(), record.locale)?;
    Ok(Message::builder()
        .from(mailbox(&settings.from)?)
        .to(mailbox(&settings.to)?)
        .subject(subject(record.locale))
        .header(ContentType::TEXT_PLAIN)
        .body(body)?)
}

/// Deliver one record over SMTP with STARTTLS.
pub async fn send_record(settings: &SmtpSettings, record: &ExtractedRecord) -> Result<(), EmailError> {
    let message = build_message(settings, record)?;
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
        .port(settings.port)
        .credentials(Credentials::new(settings.username.clone(), settings.password.clone()))
        .build();

    transport.send(message).await?;
    tracing::info!(to = %settings.to, host = %settings.host, "Business card emailed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizcard_core::FieldValue;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host: "smtp.example.com".into(),
            port: 587,
            username: "me".into(),
            password: "secret".into(),
            from: "me@example.com".into(),
            to: "you@example.com".into(),
        }
    }

    fn record() -> ExtractedRecord {
        ExtractedRecord {
            tax_id: FieldValue::from_matches(vec!["12345678901".into()]),
            ..ExtractedRecord::empty(Locale::Italian)
        }
    }

    #[test]
    fn message_carries_subject_and_json_body() {
        let message = build_message(&settings(), &record()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Dati biglietto da visita"));
        assert!(raw.contains("To: you@example.com"));
        assert!(raw.contains("\"Partita IVA\": \"12345678901\""));
    }

    #[test]
    fn english_subject() {
        assert_eq!(subject(Locale::English), "Business card data");
    }

    #[test]
    fn bad_recipient_is_reported() {
        let mut s = settings();
        s.to = "not an address".into();
        let err = build_message(&s, &record()).unwrap_err();
        assert!(matches!(err, EmailError::Address { ref address, .. } if address == "not an address"));
    }
}
