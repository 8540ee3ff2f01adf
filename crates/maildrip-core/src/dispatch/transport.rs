//! Outbound mail transport

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use maildrip_common::config::SmtpConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// One outgoing email: a single send addressed to all recipients
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub recipients: Vec<String>,
}

/// Transport-level failure of a send attempt
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("Failed to create SMTP transport: {0}")]
    Connect(String),

    #[error("SMTP send failed: {0}")]
    Send(String),
}

/// Black-box mail sending capability
///
/// Returns the server's success response text, or a transport failure with a
/// description suitable for the dispatch log.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError>;
}

/// SMTP mailer backed by lettre
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(email: &OutgoingEmail) -> Result<Message, TransportError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("from {}: {}", email.from, e)))?;

        let mut builder = Message::builder().from(from).subject(&email.subject);

        for recipient in &email.recipients {
            let to: Mailbox = recipient
                .parse()
                .map_err(|e| TransportError::InvalidAddress(format!("to {}: {}", recipient, e)))?;
            builder = builder.to(to);
        }

        builder
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| TransportError::Build(e.to_string()))
    }

    fn build_mailer(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, TransportError> {
        let mut transport = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .port(self.config.port)
        } else if self.config.use_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| TransportError::Connect(e.to_string()))?
                .port(self.config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
                .port(self.config.port)
        };

        if let (Some(username), Some(password)) = (&self.config.username, &self.config.password) {
            transport = transport.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(transport.timeout(Some(Duration::from_secs(30))).build())
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<String, TransportError> {
        let message = Self::build_message(email)?;
        let mailer = self.build_mailer()?;

        match mailer.send(message).await {
            Ok(response) => {
                debug!(code = %response.code(), "Email accepted by relay");
                let detail = response.message().collect::<Vec<_>>().join(" ");
                Ok(format!("{} {}", response.code(), detail))
            }
            Err(e) => Err(TransportError::Send(e.to_string())),
        }
    }
}
