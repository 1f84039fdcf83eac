//! Domain models for the mailer

pub mod email;
pub mod message;

pub use email::*;
pub use message::*;
