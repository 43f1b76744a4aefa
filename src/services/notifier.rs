// src/services/notifier.rs
//
// Transporte de e-mail. O resto da aplicação só conhece o trait `Notifier`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::config::SmtpSettings;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("endereço inválido: {0}")]
    InvalidAddress(String),

    #[error("falha ao montar a mensagem: {0}")]
    Build(String),

    #[error("falha no envio: {0}")]
    Send(String),

    #[error("falha na configuração do SMTP: {0}")]
    Configuration(String),
}

#[derive(Debug, Clone)]
pub struct PdfAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachment: Option<PdfAttachment>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError>;
}

// =============================================================================
//  SMTP
// =============================================================================

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| NotifyError::Configuration(format!("relay {}: {}", settings.host, e)))?
            .port(settings.port);

        if let (Some(user), Some(password)) = (&settings.user, &settings.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| NotifyError::InvalidAddress(format!("{}: {}", settings.from, e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

/// Monta a mensagem MIME (HTML + PDF opcional).
pub fn build_message(from: &Mailbox, email: &OutgoingEmail) -> Result<Message, NotifyError> {
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| NotifyError::InvalidAddress(format!("{}: {}", email.to, e)))?;

    let builder = Message::builder()
        .from(from.clone())
        .to(to)
        .subject(&email.subject);

    let html_part = SinglePart::builder()
        .header(ContentType::TEXT_HTML)
        .body(email.html.clone());

    let message = match &email.attachment {
        Some(pdf) => {
            let content_type = ContentType::parse("application/pdf")
                .map_err(|e| NotifyError::Build(e.to_string()))?;
            let attachment = Attachment::new(pdf.filename.clone()).body(pdf.bytes.clone(), content_type);
            builder.multipart(MultiPart::mixed().singlepart(html_part).singlepart(attachment))
        }
        None => builder.singlepart(html_part),
    };

    message.map_err(|e| NotifyError::Build(e.to_string()))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError> {
        let message = build_message(&self.from, &email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        tracing::info!(to = %email.to, subject = %email.subject, "📧 E-mail enviado");
        Ok(())
    }
}

// =============================================================================
//  SÓ LOG (sem SMTP configurado, e nos testes)
// =============================================================================

#[derive(Default)]
pub struct LogNotifier {
    sent: AtomicU64,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: OutgoingEmail) -> Result<(), NotifyError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            with_pdf = email.attachment.is_some(),
            "[LOG] e-mail não enviado (SMTP não configurado)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from() -> Mailbox {
        "Minha Empresa <no-reply@example.com>".parse().unwrap()
    }

    fn email(to: &str, attachment: Option<PdfAttachment>) -> OutgoingEmail {
        OutgoingEmail {
            to: to.to_string(),
            subject: "ใบแจ้งหนี้ INV2568010001".to_string(),
            html: "<p>Olá</p>".to_string(),
            attachment,
        }
    }

    #[test]
    fn builds_html_message_with_pdf_attachment() {
        let pdf = PdfAttachment {
            filename: "INV2568010001.pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        };
        let message = build_message(&from(), &email("customer@example.com", Some(pdf))).unwrap();
        let raw = String::from_utf8_lossy(&message.formatted()).to_string();

        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("INV2568010001.pdf"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let err = build_message(&from(), &email("not-an-address", None)).unwrap_err();
        assert!(matches!(err, NotifyError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn log_notifier_counts_messages() {
        let notifier = LogNotifier::new();
        notifier.send(email("a@example.com", None)).await.unwrap();
        notifier.send(email("b@example.com", None)).await.unwrap();
        assert_eq!(notifier.sent_count(), 2);
    }
}
