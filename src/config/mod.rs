//! Configuration management for the mailer

use crate::domain::{SmtpConfig, SmtpTls};
use crate::i18n::{normalize_locale, DEFAULT_LOCALE};
use crate::service::{MailerSettings, DEFAULT_EXPORT_EXPIRATION_DAYS};
use anyhow::{Context, Result};
use std::env;
use validator::Validate;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Outgoing mail server
    pub smtp: SmtpConfig,
    /// Sender identity and per-kind defaults
    pub mailer: MailerSettings,
    /// Locale used when a request names none or an unsupported one
    pub default_locale: String,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// "text" or "json"
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            smtp: SmtpConfig {
                host: var("SMTP_HOST").context("SMTP_HOST is required")?,
                port: var("SMTP_PORT")
                    .unwrap_or_else(|| "465".to_string())
                    .parse()
                    .context("Invalid SMTP_PORT")?,
                username: var("SMTP_USERNAME").filter(|v| !v.is_empty()),
                password: var("SMTP_PASSWORD").filter(|v| !v.is_empty()),
                tls: match var("SMTP_TLS") {
                    Some(mode) => mode
                        .parse::<SmtpTls>()
                        .map_err(anyhow::Error::msg)
                        .context("Invalid SMTP_TLS")?,
                    None => SmtpTls::default(),
                },
            },
            mailer: MailerSettings {
                from_email: var("MAILER_FROM_EMAIL").context("MAILER_FROM_EMAIL is required")?,
                from_name: var("MAILER_FROM_NAME").filter(|v| !v.is_empty()),
                app_name: var("MAILER_APP_NAME").unwrap_or_else(|| "Mailer".to_string()),
                export_expiration_days: match var("MAILER_EXPORT_EXPIRATION_DAYS") {
                    Some(days) => days
                        .parse()
                        .context("Invalid MAILER_EXPORT_EXPIRATION_DAYS")?,
                    None => DEFAULT_EXPORT_EXPIRATION_DAYS,
                },
            },
            default_locale: var("MAILER_DEFAULT_LOCALE")
                .map(|code| normalize_locale(&code))
                .unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            telemetry: TelemetryConfig {
                log_format: var("LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Check field constraints that parsing alone does not catch
    pub fn validate(&self) -> Result<()> {
        self.smtp.validate().context("Invalid SMTP configuration")?;
        self.mailer
            .validate()
            .context("Invalid mailer configuration")?;

        if self.default_locale.is_empty() {
            anyhow::bail!("MAILER_DEFAULT_LOCALE must not be empty");
        }

        if !matches!(self.telemetry.log_format.as_str(), "text" | "json") {
            anyhow::bail!(
                "Invalid LOG_FORMAT '{}', expected 'text' or 'json'",
                self.telemetry.log_format
            );
        }
        Ok(())
    }

    /// Get SMTP server address
    pub fn smtp_addr(&self) -> String {
        format!("{}:{}", self.smtp.host, self.smtp.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::TranslationCatalog;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SMTP_HOST", "smtp.example.com"),
        ("MAILER_FROM_EMAIL", "noreply@example.com"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        REQUIRED.iter().chain(extra).copied().collect()
    }

    #[test]
    fn test_config_defaults() {
        let config = load(REQUIRED).unwrap();

        assert_eq!(config.smtp.port, 465);
        assert_eq!(config.smtp.tls, SmtpTls::Implicit);
        assert_eq!(config.smtp.username, None);
        assert_eq!(config.mailer.app_name, "Mailer");
        assert_eq!(config.default_locale, "en");
        assert_eq!(config.mailer.export_expiration_days, 7);
        assert_eq!(config.mailer.from_name, None);
        assert_eq!(config.telemetry, TelemetryConfig::default());
        assert_eq!(config.smtp_addr(), "smtp.example.com:465");
    }

    #[test]
    fn test_config_overrides() {
        let config = load(&with(&[
            ("SMTP_PORT", "587"),
            ("SMTP_TLS", "starttls"),
            ("SMTP_USERNAME", "user"),
            ("SMTP_PASSWORD", "pass"),
            ("MAILER_FROM_NAME", "Example"),
            ("MAILER_APP_NAME", "Example App"),
            ("MAILER_DEFAULT_LOCALE", "fr"),
            ("MAILER_EXPORT_EXPIRATION_DAYS", "3"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.tls, SmtpTls::StartTls);
        assert_eq!(config.smtp.username.as_deref(), Some("user"));
        assert_eq!(config.mailer.from_name.as_deref(), Some("Example"));
        assert_eq!(config.default_locale, "fr");
        assert_eq!(config.mailer.export_expiration_days, 3);
        assert_eq!(config.telemetry.log_format, "json");
    }

    #[test]
    fn test_config_requires_host_and_sender() {
        let err = load(&[("MAILER_FROM_EMAIL", "noreply@example.com")]).unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));

        let err = load(&[("SMTP_HOST", "smtp.example.com")]).unwrap_err();
        assert!(err.to_string().contains("MAILER_FROM_EMAIL"));
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        assert!(load(&with(&[("SMTP_PORT", "smtp")])).is_err());
        assert!(load(&with(&[("SMTP_TLS", "ssl3")])).is_err());
        assert!(load(&with(&[("MAILER_EXPORT_EXPIRATION_DAYS", "-1")])).is_err());
        assert!(load(&with(&[("MAILER_EXPORT_EXPIRATION_DAYS", "0")])).is_err());
        assert!(load(&with(&[("LOG_FORMAT", "xml")])).is_err());
        assert!(load(&with(&[("MAILER_DEFAULT_LOCALE", "  ")])).is_err());
        assert!(load(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("MAILER_FROM_EMAIL", "not-an-email"),
        ])
        .is_err());
    }

    #[test]
    fn test_default_locale_drives_catalog() {
        let config = load(&with(&[("MAILER_DEFAULT_LOCALE", " FR ")])).unwrap();
        assert_eq!(config.default_locale, "fr");

        let catalog = TranslationCatalog::embedded(&config.default_locale).unwrap();
        assert_eq!(catalog.resolve(None).code(), "fr");
        assert_eq!(catalog.resolve(Some("xx")).code(), "fr");
    }

    #[test]
    fn test_empty_credentials_are_ignored() {
        let config = load(&with(&[("SMTP_USERNAME", ""), ("SMTP_PASSWORD", "")])).unwrap();
        assert_eq!(config.smtp.username, None);
        assert_eq!(config.smtp.password, None);
    }
}
