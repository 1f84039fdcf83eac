//! Email transport and rendering
//!
//! - `provider`: the transport seam the mailer hands finished messages to
//! - `smtp`: SMTP provider (using lettre)
//! - `templates`: placeholder engine and the embedded HTML templates

pub mod provider;
pub mod smtp;
pub mod templates;

pub use provider::{EmailProvider, EmailProviderError};
pub use smtp::SmtpEmailProvider;
pub use templates::{
    EmailTemplate, EmbeddedTemplates, TemplateContext, TemplateEngine, TemplateError,
    TemplateRenderer,
};
