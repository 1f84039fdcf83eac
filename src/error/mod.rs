//! Unified error handling for the mailer pipeline

use crate::domain::MessageKind;
use crate::email::{EmailProviderError, TemplateError};
use thiserror::Error;

/// Mailer-wide result type
pub type Result<T> = std::result::Result<T, MailerError>;

/// Errors surfaced by a send or compose operation.
///
/// Locale misses never show up here: they resolve to the default locale.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Missing parameter '{name}' for {kind} email")]
    MissingParameter { kind: MessageKind, name: &'static str },

    #[error("Unresolved placeholder '{placeholder}' in '{key}'")]
    UnresolvedPlaceholder { key: String, placeholder: String },

    #[error("Translation '{key}' is missing from locale '{locale}' and the default locale")]
    MissingTranslation { key: String, locale: String },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Transport(#[from] EmailProviderError),
}

impl MailerError {
    /// Pipeline stage that produced the error, used as a metrics label
    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingParameter { .. }
            | Self::UnresolvedPlaceholder { .. }
            | Self::MissingTranslation { .. } => "compose",
            Self::Template(_) => "render",
            Self::Transport(_) => "transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MailerError::MissingParameter {
            kind: MessageKind::Invitation,
            name: "item_name",
        };
        assert_eq!(
            err.to_string(),
            "Missing parameter 'item_name' for invitation email"
        );
    }

    #[test]
    fn test_transport_error_is_transparent() {
        let err: MailerError = EmailProviderError::SendFailed("550 rejected".to_string()).into();
        assert_eq!(err.to_string(), "Send failed: 550 rejected");
        assert!(matches!(
            err,
            MailerError::Transport(EmailProviderError::SendFailed(_))
        ));
    }

    #[test]
    fn test_error_stage() {
        let compose = MailerError::UnresolvedPlaceholder {
            key: "invitation_info".to_string(),
            placeholder: "item_name".to_string(),
        };
        let render: MailerError = TemplateError::RenderFailed("boom".to_string()).into();
        let transport: MailerError = EmailProviderError::RateLimited.into();

        assert_eq!(compose.stage(), "compose");
        assert_eq!(render.stage(), "render");
        assert_eq!(transport.stage(), "transport");
    }
}
