//! Dispatch facade: one operation per email the host application sends

use crate::domain::{
    ComposedMessage, EmailAddress, InterpolationBag, MessageKind, Recipient, RenderContext,
};
use crate::email::{EmailProvider, EmbeddedTemplates, TemplateRenderer};
use crate::error::Result;
use crate::i18n::TranslationCatalog;
use crate::service::MessageComposer;
use crate::telemetry::metrics::{EMAILS_FAILED_TOTAL, EMAILS_SENT_TOTAL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Days an export download link stays valid when the caller does not say
pub const DEFAULT_EXPORT_EXPIRATION_DAYS: u32 = 7;

/// Deployment-wide mailer settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct MailerSettings {
    /// Sender address for every email
    #[validate(email)]
    pub from_email: String,

    pub from_name: Option<String>,

    /// Shown in the footer of every email
    #[validate(length(min = 1, max = 100))]
    pub app_name: String,

    #[validate(range(min = 1))]
    pub export_expiration_days: u32,
}

impl MailerSettings {
    pub fn from_address(&self) -> EmailAddress {
        EmailAddress {
            email: self.from_email.clone(),
            name: self.from_name.clone(),
        }
    }
}

/// Everything needed to produce one email
#[derive(Debug, Clone, PartialEq)]
pub struct MailRequest {
    pub kind: MessageKind,
    pub recipient: Recipient,
    pub link: String,
    pub params: InterpolationBag,
    pub re_registration_attempt: bool,
    /// Explicit locale; overrides the recipient's preference when set
    pub locale: Option<String>,
}

impl MailRequest {
    pub fn new(kind: MessageKind, recipient: Recipient, link: impl Into<String>) -> Self {
        Self {
            kind,
            recipient,
            link: link.into(),
            params: InterpolationBag::new(),
            re_registration_attempt: false,
            locale: None,
        }
    }

    pub fn login(
        recipient: Recipient,
        link: impl Into<String>,
        re_registration_attempt: bool,
    ) -> Self {
        Self {
            re_registration_attempt,
            ..Self::new(MessageKind::Login, recipient, link)
        }
    }

    pub fn register(recipient: Recipient, link: impl Into<String>) -> Self {
        Self::new(MessageKind::Register, recipient, link)
    }

    /// Invitees usually have no account yet, so only an address is known
    pub fn invitation(
        email: impl Into<String>,
        link: impl Into<String>,
        item_name: &str,
        creator_name: &str,
    ) -> Self {
        let mut request = Self::new(MessageKind::Invitation, Recipient::new(email), link);
        request
            .params
            .insert("item_name", item_name)
            .insert("creator_name", creator_name);
        request
    }

    pub fn export_ready(
        recipient: Recipient,
        link: impl Into<String>,
        item_name: &str,
        expiration_days: u32,
    ) -> Self {
        let mut request = Self::new(MessageKind::ExportReady, recipient, link);
        request
            .params
            .insert("item_name", item_name)
            .insert("days", expiration_days);
        request
    }

    pub fn published(recipient: Recipient, link: impl Into<String>, item_name: &str) -> Self {
        let mut request = Self::new(MessageKind::Published, recipient, link);
        request.params.insert("item_name", item_name);
        request
    }

    pub fn in_locale(mut self, locale: Option<&str>) -> Self {
        self.locale = locale.map(str::to_string);
        self
    }

    /// Locale to resolve: explicit first, then the recipient's preference
    pub fn requested_locale(&self) -> Option<&str> {
        self.locale
            .as_deref()
            .or(self.recipient.preferred_locale.as_deref())
    }
}

/// Sends localized transactional emails through an [`EmailProvider`]
pub struct Mailer {
    catalog: Arc<TranslationCatalog>,
    composer: MessageComposer,
    provider: Arc<dyn EmailProvider>,
    from: EmailAddress,
    export_expiration_days: u32,
}

impl Mailer {
    pub fn new(
        catalog: Arc<TranslationCatalog>,
        provider: Arc<dyn EmailProvider>,
        settings: &MailerSettings,
    ) -> Self {
        Self::with_renderer(catalog, Arc::new(EmbeddedTemplates), provider, settings)
    }

    pub fn with_renderer(
        catalog: Arc<TranslationCatalog>,
        renderer: Arc<dyn TemplateRenderer>,
        provider: Arc<dyn EmailProvider>,
        settings: &MailerSettings,
    ) -> Self {
        Self {
            composer: MessageComposer::new(catalog.clone(), renderer, settings.app_name.clone()),
            catalog,
            provider,
            from: settings.from_address(),
            export_expiration_days: settings.export_expiration_days,
        }
    }

    pub fn catalog(&self) -> &TranslationCatalog {
        &self.catalog
    }

    /// Send a magic sign-in link
    pub async fn send_login_email(
        &self,
        recipient: &Recipient,
        link: &str,
        re_registration_attempt: bool,
        locale: Option<&str>,
    ) -> Result<()> {
        let request = MailRequest::login(recipient.clone(), link, re_registration_attempt);
        self.send(request.in_locale(locale)).await
    }

    /// Send a registration confirmation link
    pub async fn send_register_email(
        &self,
        recipient: &Recipient,
        link: &str,
        locale: Option<&str>,
    ) -> Result<()> {
        let request = MailRequest::register(recipient.clone(), link);
        self.send(request.in_locale(locale)).await
    }

    /// Invite someone to collaborate on an item
    pub async fn send_invitation_email(
        &self,
        email: &str,
        link: &str,
        item_name: &str,
        creator_name: &str,
        locale: Option<&str>,
    ) -> Result<()> {
        let request = MailRequest::invitation(email, link, item_name, creator_name);
        self.send(request.in_locale(locale)).await
    }

    /// Tell a member their export is ready to download
    pub async fn send_export_actions_email(
        &self,
        recipient: &Recipient,
        link: &str,
        item_name: &str,
        locale: Option<&str>,
        expiration_days: Option<u32>,
    ) -> Result<()> {
        let days = expiration_days.unwrap_or(self.export_expiration_days);
        let request = MailRequest::export_ready(recipient.clone(), link, item_name, days);
        self.send(request.in_locale(locale)).await
    }

    /// Tell a member an item has been published
    pub async fn send_publish_notification_email(
        &self,
        recipient: &Recipient,
        link: &str,
        item_name: &str,
        locale: Option<&str>,
    ) -> Result<()> {
        let request = MailRequest::published(recipient.clone(), link, item_name);
        self.send(request.in_locale(locale)).await
    }

    /// Compose and dispatch a request. Errors are returned to the caller untouched.
    #[tracing::instrument(skip_all, fields(kind = %request.kind))]
    pub async fn send(&self, request: MailRequest) -> Result<()> {
        let result = self.deliver(&request).await;

        match &result {
            Ok(()) => {
                metrics::counter!(EMAILS_SENT_TOTAL, "kind" => request.kind.as_str()).increment(1)
            }
            Err(e) => metrics::counter!(
                EMAILS_FAILED_TOTAL,
                "kind" => request.kind.as_str(),
                "stage" => e.stage()
            )
            .increment(1),
        }

        result
    }

    /// Compose a request without sending it
    pub async fn preview(&self, request: &MailRequest) -> Result<ComposedMessage> {
        let translations = self.catalog.resolve(request.requested_locale());
        let ctx = RenderContext {
            recipient: &request.recipient,
            link: &request.link,
            re_registration_attempt: request.re_registration_attempt,
        };

        self.composer
            .compose(request.kind, translations, &request.params, &ctx)
            .await
    }

    /// Check that the provider accepts connections
    pub async fn test_connection(&self) -> Result<()> {
        self.provider.test_connection().await?;
        Ok(())
    }

    async fn deliver(&self, request: &MailRequest) -> Result<()> {
        let composed = self.preview(request).await?;
        let message = composed.into_email(self.from.clone());

        let result = self.provider.send(&message).await?;
        tracing::debug!(
            provider = self.provider.provider_name(),
            message_id = ?result.message_id,
            "Email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailSendResult, ParamValue};
    use crate::email::provider::MockEmailProvider;
    use crate::email::EmailProviderError;
    use crate::error::MailerError;
    use crate::i18n::DEFAULT_LOCALE;

    fn settings() -> MailerSettings {
        MailerSettings {
            from_email: "noreply@example.com".to_string(),
            from_name: Some("Example".to_string()),
            app_name: "Example".to_string(),
            export_expiration_days: DEFAULT_EXPORT_EXPIRATION_DAYS,
        }
    }

    fn mailer_with(provider: MockEmailProvider) -> Mailer {
        let catalog = Arc::new(TranslationCatalog::embedded(DEFAULT_LOCALE).unwrap());
        Mailer::new(catalog, Arc::new(provider), &settings())
    }

    #[test]
    fn test_settings_validation() {
        assert!(settings().validate().is_ok());

        let invalid = MailerSettings {
            from_email: "not-an-email".to_string(),
            ..settings()
        };
        assert!(invalid.validate().is_err());

        let zero_days = MailerSettings {
            export_expiration_days: 0,
            ..settings()
        };
        assert!(zero_days.validate().is_err());
    }

    #[test]
    fn test_requested_locale_precedence() {
        let recipient = Recipient::with_name("a@b.com", "A").preferring("de");

        let request = MailRequest::register(recipient.clone(), "https://x/y");
        assert_eq!(request.requested_locale(), Some("de"));

        let request = request.in_locale(Some("fr"));
        assert_eq!(request.requested_locale(), Some("fr"));

        let request = MailRequest::register(Recipient::new("a@b.com"), "https://x/y");
        assert_eq!(request.requested_locale(), None);
    }

    #[test]
    fn test_request_builders_fill_params() {
        let request = MailRequest::export_ready(Recipient::new("a@b.com"), "l", "my-item", 3);
        assert_eq!(request.params.get("days"), Some(&ParamValue::Number(3)));

        let request = MailRequest::invitation("x@y.com", "l", "item", "creator");
        assert_eq!(request.recipient, Recipient::new("x@y.com"));
        assert!(request.params.contains("creator_name"));
    }

    #[tokio::test]
    async fn test_send_login_email_uses_configured_sender() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .withf(|message| {
                message.from == EmailAddress::with_name("noreply@example.com", "Example")
                    && message.to == vec![EmailAddress::with_name("a@b.com", "A")]
                    && message.subject == "Sign in"
                    && message.html_body.contains("https://x/y")
            })
            .times(1)
            .returning(|_| Ok(EmailSendResult::success(None)));
        provider.expect_provider_name().returning(|| "mock");

        let mailer = mailer_with(provider);
        mailer
            .send_login_email(&Recipient::with_name("a@b.com", "A"), "https://x/y", false, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_export_uses_default_expiration() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .withf(|message| message.html_body.contains("valid for 7 days"))
            .times(1)
            .returning(|_| Ok(EmailSendResult::success(None)));
        provider.expect_provider_name().returning(|| "mock");

        let mailer = mailer_with(provider);
        mailer
            .send_export_actions_email(
                &Recipient::new("a@b.com"),
                "https://x/y",
                "item",
                None,
                None,
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_is_propagated() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_send()
            .times(1)
            .returning(|_| Err(EmailProviderError::AuthenticationFailed("535".to_string())));

        let mailer = mailer_with(provider);
        let err = mailer
            .send_register_email(&Recipient::new("a@b.com"), "https://x/y", Some("fr"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            MailerError::Transport(EmailProviderError::AuthenticationFailed(ref msg))
                if msg == "535"
        ));
    }

    #[tokio::test]
    async fn test_compose_failure_skips_transport() {
        let mut provider = MockEmailProvider::new();
        provider.expect_send().never();

        let mailer = mailer_with(provider);
        let mut request = MailRequest::invitation("x@y.com", "https://x/y", "item", "creator");
        request.params = InterpolationBag::new().with("item_name", "item");

        let err = mailer.send(request).await.unwrap_err();
        assert!(matches!(err, MailerError::MissingParameter { .. }));
    }

    #[tokio::test]
    async fn test_test_connection_delegates_to_provider() {
        let mut provider = MockEmailProvider::new();
        provider
            .expect_test_connection()
            .times(1)
            .returning(|| Err(EmailProviderError::ConnectionError("refused".to_string())));

        let mailer = mailer_with(provider);
        assert!(matches!(
            mailer.test_connection().await,
            Err(MailerError::Transport(EmailProviderError::ConnectionError(_)))
        ));
    }
}
