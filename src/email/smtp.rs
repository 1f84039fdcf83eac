//! SMTP email provider implementation using lettre

use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{EmailAddress, EmailMessage, EmailSendResult, SmtpConfig, SmtpTls};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::{authentication::Credentials, PoolConfig},
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP-based email provider
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailProvider {
    /// Create a new SMTP provider from configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self, EmailProviderError> {
        let mut builder = match config.tls {
            SmtpTls::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?,
            SmtpTls::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
            }
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        // Connections are kept open and reused across sends
        builder = builder.port(config.port).pool_config(PoolConfig::new());

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    /// Build the mailbox field by field; display names are encoded by lettre
    fn parse_mailbox(address: &EmailAddress, role: &str) -> Result<Mailbox, EmailProviderError> {
        let email = address.email.parse::<Address>().map_err(|e| {
            EmailProviderError::InvalidConfiguration(format!("Invalid {} address: {}", role, e))
        })?;
        let name = address
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(Mailbox::new(name, email))
    }

    fn build_message(message: &EmailMessage) -> Result<Message, EmailProviderError> {
        let from = Self::parse_mailbox(&message.from, "from")?;

        if message.to.is_empty() {
            return Err(EmailProviderError::InvalidConfiguration(
                "No recipients specified".to_string(),
            ));
        }

        let mut email_builder = Message::builder().from(from).subject(&message.subject);
        for addr in &message.to {
            email_builder = email_builder.to(Self::parse_mailbox(addr, "to")?);
        }

        // Multipart when a plain-text alternative is provided
        match &message.text_body {
            Some(text_body) => email_builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            ),
            None => email_builder
                .header(ContentType::TEXT_HTML)
                .body(message.html_body.clone()),
        }
        .map_err(|e| EmailProviderError::SendFailed(e.to_string()))
    }

    fn classify_error(error_msg: String) -> EmailProviderError {
        let lower = error_msg.to_ascii_lowercase();
        if Self::is_throttled(&error_msg, &lower) {
            EmailProviderError::RateLimited
        } else if lower.contains("authentication") || error_msg.contains("AUTH") {
            EmailProviderError::AuthenticationFailed(error_msg)
        } else if lower.contains("connection") || lower.contains("timeout") {
            EmailProviderError::ConnectionError(error_msg)
        } else {
            EmailProviderError::SendFailed(error_msg)
        }
    }

    /// 421 and 450 replies, or servers that say so in the text
    fn is_throttled(error_msg: &str, lower: &str) -> bool {
        error_msg.contains("(421)")
            || error_msg.contains("(450)")
            || lower.contains("rate limit")
            || lower.contains("too many")
    }
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        let email = Self::build_message(message)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| Self::classify_error(e.to_string()))?;

        let message_id = response.message().next().map(|s| s.to_string());
        Ok(EmailSendResult::success(message_id))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        let connected = self
            .transport
            .test_connection()
            .await
            .map_err(|e| match Self::classify_error(e.to_string()) {
                EmailProviderError::SendFailed(msg) => EmailProviderError::ConnectionError(msg),
                other => other,
            })?;

        if connected {
            Ok(())
        } else {
            Err(EmailProviderError::ConnectionError(
                "Server did not accept the connection".to_string(),
            ))
        }
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}
