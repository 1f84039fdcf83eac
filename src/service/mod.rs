//! Business logic layer

pub mod composer;
pub mod mailer;

pub use composer::MessageComposer;
pub use mailer::{MailRequest, Mailer, MailerSettings, DEFAULT_EXPORT_EXPIRATION_DAYS};
