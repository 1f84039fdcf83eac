//! Message composition: translations + interpolation + body rendering

use crate::domain::{ComposedMessage, InterpolationBag, MessageKind, RenderContext};
use crate::email::{TemplateContext, TemplateEngine, TemplateError, TemplateRenderer};
use crate::error::{MailerError, Result};
use crate::i18n::{keys, TranslationCatalog, TranslationSet};
use std::sync::Arc;

/// Builds subject and bodies for a message kind in a resolved locale
pub struct MessageComposer {
    catalog: Arc<TranslationCatalog>,
    renderer: Arc<dyn TemplateRenderer>,
    app_name: String,
}

impl MessageComposer {
    pub fn new(
        catalog: Arc<TranslationCatalog>,
        renderer: Arc<dyn TemplateRenderer>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            renderer,
            app_name: app_name.into(),
        }
    }

    /// Compose a message.
    ///
    /// Fails before rendering anything when a required parameter is missing,
    /// so a message is either complete or not produced at all.
    pub async fn compose(
        &self,
        kind: MessageKind,
        translations: &TranslationSet,
        bag: &InterpolationBag,
        ctx: &RenderContext<'_>,
    ) -> Result<ComposedMessage> {
        Self::validate(kind, bag)?;

        let mut engine = TemplateEngine::new();
        engine.set_all(bag.iter().map(|(name, value)| (name, value.to_string())));

        let display_name = ctx
            .recipient
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let salutation_key = match display_name {
            Some(name) => {
                engine.set("name", name);
                keys::SALUTATION
            }
            None => keys::SALUTATION_ANONYMOUS,
        };

        let info_key = if kind == MessageKind::Login && ctx.re_registration_attempt {
            keys::LOGIN_RE_REGISTRATION_INFO
        } else {
            kind.info_key()
        };

        let subject = self.translate(translations, kind.title_key(), &engine)?;

        let mut context = TemplateContext::new();
        context
            .set("lang", translations.code())
            .set("title", subject.as_str())
            .set("salutation", self.translate(translations, salutation_key, &engine)?)
            .set("info", self.translate(translations, info_key, &engine)?)
            .set("button", self.translate(translations, kind.button_key(), &engine)?)
            .set("link_hint", self.translate(translations, keys::LINK_HINT, &engine)?)
            .set("footer", self.translate(translations, keys::FOOTER, &engine)?)
            .set("link", ctx.link)
            .set("app_name", self.app_name.as_str());

        let template = kind.template();
        let html_body = self.renderer.render(template, &context).await?;

        let mut text_engine = TemplateEngine::new();
        text_engine.set_all(context.iter());
        let text_body = text_engine.render(template.text_body())?;

        Ok(ComposedMessage {
            subject,
            html_body,
            text_body,
            recipient: ctx.recipient.address(),
        })
    }

    fn validate(kind: MessageKind, bag: &InterpolationBag) -> Result<()> {
        match kind
            .required_params()
            .iter()
            .copied()
            .find(|name| !bag.contains(name))
        {
            Some(name) => Err(MailerError::MissingParameter { kind, name }),
            None => Ok(()),
        }
    }

    /// Look a key up in the requested locale, then in the default locale
    fn lookup<'a>(&'a self, translations: &'a TranslationSet, key: &str) -> Result<&'a str> {
        if let Some(value) = translations.get(key) {
            return Ok(value);
        }

        let fallback = self.catalog.default_set();
        match fallback.get(key) {
            Some(value) => {
                tracing::debug!(
                    key,
                    locale = %translations.code(),
                    fallback = %fallback.code(),
                    "Translation missing, using default locale"
                );
                Ok(value)
            }
            None => Err(MailerError::MissingTranslation {
                key: key.to_string(),
                locale: translations.code().to_string(),
            }),
        }
    }

    fn translate(
        &self,
        translations: &TranslationSet,
        key: &str,
        engine: &TemplateEngine,
    ) -> Result<String> {
        let template = self.lookup(translations, key)?;
        engine.render(template).map_err(|e| match e {
            TemplateError::UnresolvedPlaceholder(placeholder) => {
                MailerError::UnresolvedPlaceholder {
                    key: key.to_string(),
                    placeholder,
                }
            }
            other => other.into(),
        })
    }
}
