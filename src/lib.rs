//! Mailer Core - localized transactional email
//!
//! This crate composes and sends the transactional emails of an application
//! (sign-in links, registration, invitations, export and publish notices) in
//! the recipient's language, over SMTP.

pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod i18n;
pub mod service;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{MailerError, Result};
pub use service::{MailRequest, Mailer};
