//! Common test utilities

use async_trait::async_trait;
use mailer_core::domain::{EmailMessage, EmailSendResult};
use mailer_core::email::{EmailProvider, EmailProviderError};
use mailer_core::i18n::{TranslationCatalog, DEFAULT_LOCALE};
use mailer_core::service::{MailerSettings, DEFAULT_EXPORT_EXPIRATION_DAYS};
use mailer_core::Mailer;
use std::sync::{Arc, Mutex};

/// Provider that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingEmailProvider {
    sent: Mutex<Vec<EmailMessage>>,
    fail_with: Option<fn() -> EmailProviderError>,
}

impl RecordingEmailProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider whose sends always fail with the given error
    pub fn failing(error: fn() -> EmailProviderError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> EmailMessage {
        self.sent().pop().expect("no email was sent")
    }
}

#[async_trait]
impl EmailProvider for RecordingEmailProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        if let Some(error) = self.fail_with {
            return Err(error());
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(EmailSendResult::success(Some(format!("test-{}", sent.len()))))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

pub fn test_settings() -> MailerSettings {
    MailerSettings {
        from_email: "noreply@example.com".to_string(),
        from_name: Some("Example".to_string()),
        app_name: "Example".to_string(),
        export_expiration_days: DEFAULT_EXPORT_EXPIRATION_DAYS,
    }
}

/// Mailer over the embedded catalog and a recording provider
pub fn test_mailer() -> (Mailer, Arc<RecordingEmailProvider>) {
    test_mailer_with(RecordingEmailProvider::new())
}

pub fn test_mailer_with(provider: RecordingEmailProvider) -> (Mailer, Arc<RecordingEmailProvider>) {
    let catalog = Arc::new(TranslationCatalog::embedded(DEFAULT_LOCALE).unwrap());
    let provider = Arc::new(provider);
    let mailer = Mailer::new(catalog, provider.clone(), &test_settings());
    (mailer, provider)
}
