//! Email template system
//!
//! Templates use `{{variable_name}}` placeholders. Substitution is a single
//! left-to-right pass: inserted values are never scanned again, and a
//! placeholder without a value is an error rather than being left in the output.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

lazy_static::lazy_static! {
    static ref PLACEHOLDER_REGEX: regex::Regex =
        regex::Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").unwrap();
}

/// Template error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("No value for placeholder '{0}'")]
    UnresolvedPlaceholder(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Available email templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailTemplate {
    Login,
    Register,
    Invitation,
    ExportReady,
    Published,
}

impl EmailTemplate {
    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::Login => LOGIN_TEMPLATE,
            Self::Register => REGISTER_TEMPLATE,
            Self::Invitation => INVITATION_TEMPLATE,
            Self::ExportReady => EXPORT_READY_TEMPLATE,
            Self::Published => PUBLISHED_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        TEXT_TEMPLATE
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default, Clone)]
pub struct TemplateEngine {
    variables: BTreeMap<String, String>,
    escape_html: bool,
}

impl TemplateEngine {
    /// Create a new template engine that inserts values verbatim
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine that HTML-escapes every inserted value
    pub fn html() -> Self {
        Self {
            escape_html: true,
            ..Self::default()
        }
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set multiple variables from an iterator
    pub fn set_all<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in iter {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    /// Render a template string, replacing {{variable}} with values
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let mut result = String::with_capacity(template.len());
        let mut last = 0;

        for caps in PLACEHOLDER_REGEX.captures_iter(template) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            let value = self
                .variables
                .get(name.as_str())
                .ok_or_else(|| TemplateError::UnresolvedPlaceholder(name.as_str().to_string()))?;

            result.push_str(&template[last..whole.start()]);
            if self.escape_html {
                result.push_str(&html_escape::encode_double_quoted_attribute(value));
            } else {
                result.push_str(value);
            }
            last = whole.end();
        }

        result.push_str(&template[last..]);
        Ok(result)
    }
}

/// Values handed to a [`TemplateRenderer`] for one body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    values: BTreeMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Renders the HTML body of an email
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template: EmailTemplate,
        context: &TemplateContext,
    ) -> Result<String, TemplateError>;
}

/// Renderer backed by the templates compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedTemplates;

#[async_trait]
impl TemplateRenderer for EmbeddedTemplates {
    async fn render(
        &self,
        template: EmailTemplate,
        context: &TemplateContext,
    ) -> Result<String, TemplateError> {
        let mut engine = TemplateEngine::html();
        engine.set_all(context.iter());
        engine.render(template.html_body())
    }
}

// ============================================================================
// Email Templates
// ============================================================================

const LOGIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .button { display: inline-block; background-color: #5050d2; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #5050d2; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <p>{{salutation}}</p>
        <p>{{info}}</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{link}}" class="button">{{button}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            {{link_hint}}<br>
            <a href="{{link}}" class="link">{{link}}</a>
        </p>
        <div class="footer">
            <p>{{footer}}</p>
            <p>{{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const REGISTER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .header h1 { color: #5050d2; margin: 0; font-size: 24px; }
        .button { display: inline-block; background-color: #5050d2; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #5050d2; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{title}}</h1>
        </div>
        <p>{{salutation}}</p>
        <p>{{info}}</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{link}}" class="button">{{button}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            {{link_hint}}<br>
            <a href="{{link}}" class="link">{{link}}</a>
        </p>
        <div class="footer">
            <p>{{footer}}</p>
            <p>{{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const INVITATION_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header { text-align: center; margin-bottom: 30px; }
        .header h1 { color: #5050d2; margin: 0; font-size: 24px; }
        .button { display: inline-block; background-color: #5050d2; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #5050d2; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{title}}</h1>
        </div>
        <p>{{salutation}}</p>
        <p><strong>{{info}}</strong></p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{link}}" class="button">{{button}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            {{link_hint}}<br>
            <a href="{{link}}" class="link">{{link}}</a>
        </p>
        <div class="footer">
            <p>{{footer}}</p>
            <p>{{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const EXPORT_READY_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .button { display: inline-block; background-color: #5050d2; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #5050d2; word-break: break-all; }
        .notice { background-color: #fef3c7; border: 1px solid #f59e0b; padding: 12px; border-radius: 6px; margin: 20px 0; }
    </style>
</head>
<body>
    <div class="container">
        <p>{{salutation}}</p>
        <div class="notice">{{info}}</div>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{link}}" class="button">{{button}}</a>
        </p>
        <p style="font-size: 14px; color: #666;">
            {{link_hint}}<br>
            <a href="{{link}}" class="link">{{link}}</a>
        </p>
        <div class="footer">
            <p>{{footer}}</p>
            <p>{{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const PUBLISHED_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="{{lang}}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}}</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }
        .header h1 { color: #5050d2; margin: 0 0 20px; font-size: 22px; }
        .button { display: inline-block; background-color: #5050d2; color: #ffffff; padding: 14px 28px; text-decoration: none; border-radius: 6px; font-weight: 600; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{title}}</h1>
        </div>
        <p>{{salutation}}</p>
        <p>{{info}}</p>
        <p style="text-align: center; margin: 30px 0;">
            <a href="{{link}}" class="button">{{button}}</a>
        </p>
        <div class="footer">
            <p>{{footer}}</p>
            <p>{{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const TEXT_TEMPLATE: &str = r#"{{salutation}}

{{info}}

{{button}}: {{link}}

{{footer}}

{{app_name}}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_engine_basic() {
        let mut engine = TemplateEngine::new();
        engine.set("name", "John");

        let result = engine.render("Hello, {{name}}!").unwrap();
        assert_eq!(result, "Hello, John!");
    }

    #[test]
    fn test_template_engine_multiple_vars() {
        let mut engine = TemplateEngine::new();
        engine.set("first", "John").set("last", "Doe");

        let result = engine.render("Hello, {{first}} {{ last }}!").unwrap();
        assert_eq!(result, "Hello, John Doe!");
    }

    #[test]
    fn test_template_engine_set_all() {
        let mut engine = TemplateEngine::new();
        engine.set_all([("a", "1"), ("b", "2")]);

        let result = engine.render("{{a}} + {{b}}").unwrap();
        assert_eq!(result, "1 + 2");
    }

    #[test]
    fn test_template_engine_missing_var() {
        let mut engine = TemplateEngine::new();
        engine.set("greeting", "Hello");

        let result = engine.render("{{greeting}}, {{name}}!");
        assert_eq!(
            result,
            Err(TemplateError::UnresolvedPlaceholder("name".to_string()))
        );
    }

    #[test]
    fn test_template_engine_repeated_var() {
        let mut engine = TemplateEngine::new();
        engine.set("name", "Alice");

        let result = engine.render("{{name}} loves {{name}}").unwrap();
        assert_eq!(result, "Alice loves Alice");
    }

    #[test]
    fn test_template_engine_values_are_not_rescanned() {
        let mut engine = TemplateEngine::new();
        engine.set("item_name", "{{creator_name}}");

        let result = engine.render("Item: {{item_name}}").unwrap();
        assert_eq!(result, "Item: {{creator_name}}");
    }

    #[test]
    fn test_template_engine_html_escaping() {
        let mut engine = TemplateEngine::html();
        engine
            .set("item", "<b>Tom & Jerry</b>")
            .set("link", "https://x/y?a=1&b=2");

        let result = engine.render("{{item}} {{link}}").unwrap();
        assert_eq!(
            result,
            "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt; https://x/y?a=1&amp;b=2"
        );
    }

    #[test]
    fn test_template_without_placeholders() {
        let engine = TemplateEngine::new();
        assert_eq!(engine.render("plain text").unwrap(), "plain text");
    }

    fn full_context() -> TemplateContext {
        let mut context = TemplateContext::new();
        for key in [
            "lang",
            "title",
            "salutation",
            "info",
            "button",
            "link_hint",
            "footer",
            "app_name",
        ] {
            context.set(key, format!("<{}>", key));
        }
        context.set("link", "https://example.com/auth?t=abc");
        context
    }

    #[tokio::test]
    async fn test_embedded_templates_render_every_template() {
        let context = full_context();
        for template in [
            EmailTemplate::Login,
            EmailTemplate::Register,
            EmailTemplate::Invitation,
            EmailTemplate::ExportReady,
            EmailTemplate::Published,
        ] {
            let html = EmbeddedTemplates.render(template, &context).await.unwrap();
            assert!(html.contains("&lt;info&gt;"), "{:?}", template);
            assert!(html.contains("https://example.com/auth?t=abc"));
            assert!(!html.contains("{{"), "{:?}", template);
        }
    }

    #[tokio::test]
    async fn test_embedded_templates_missing_context_value() {
        let mut context = TemplateContext::new();
        context.set("lang", "en");

        let result = EmbeddedTemplates
            .render(EmailTemplate::Login, &context)
            .await;
        assert!(matches!(
            result,
            Err(TemplateError::UnresolvedPlaceholder(_))
        ));
    }

    #[test]
    fn test_text_template_renders_plain_values() {
        let mut engine = TemplateEngine::new();
        engine.set_all(full_context().iter());

        let text = engine.render(EmailTemplate::Login.text_body()).unwrap();
        assert!(text.starts_with("<salutation>"));
        assert!(text.contains("<button>: https://example.com/auth?t=abc"));
    }

    #[test]
    fn test_template_context() {
        let mut context = TemplateContext::new();
        context.set("lang", "fr").set("lang", "de").set("app_name", "App");
        assert_eq!(
            context.iter().collect::<Vec<_>>(),
            vec![("app_name", "App"), ("lang", "de")]
        );
    }
}
