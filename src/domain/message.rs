//! Message composition domain types

use crate::domain::EmailAddress;
use crate::email::EmailTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of emails this service can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Magic sign-in link
    Login,
    /// Registration confirmation link
    Register,
    /// Invitation to collaborate on an item
    Invitation,
    /// An export archive is ready to download
    ExportReady,
    /// An item has been published
    Published,
}

impl MessageKind {
    /// Get all message kinds
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::Login,
            MessageKind::Register,
            MessageKind::Invitation,
            MessageKind::ExportReady,
            MessageKind::Published,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Invitation => "invitation",
            Self::ExportReady => "export_ready",
            Self::Published => "published",
        }
    }

    /// HTML template used for the body
    pub fn template(&self) -> EmailTemplate {
        match self {
            Self::Login => EmailTemplate::Login,
            Self::Register => EmailTemplate::Register,
            Self::Invitation => EmailTemplate::Invitation,
            Self::ExportReady => EmailTemplate::ExportReady,
            Self::Published => EmailTemplate::Published,
        }
    }

    /// Parameters the interpolation bag must carry, in the order callers supply them
    pub fn required_params(&self) -> &'static [&'static str] {
        match self {
            Self::Login | Self::Register => &[],
            Self::Invitation => &["item_name", "creator_name"],
            Self::ExportReady => &["item_name", "days"],
            Self::Published => &["item_name"],
        }
    }

    /// Translation key of the subject line
    pub fn title_key(&self) -> &'static str {
        match self {
            Self::Login => "login_title",
            Self::Register => "register_title",
            Self::Invitation => "invitation_title",
            Self::ExportReady => "export_ready_title",
            Self::Published => "published_title",
        }
    }

    /// Translation key of the informational sentence shown above the button
    pub fn info_key(&self) -> &'static str {
        match self {
            Self::Login => "login_info",
            Self::Register => "register_info",
            Self::Invitation => "invitation_info",
            Self::ExportReady => "export_ready_info",
            Self::Published => "published_info",
        }
    }

    /// Translation key of the call-to-action button label
    pub fn button_key(&self) -> &'static str {
        match self {
            Self::Login => "login_button",
            Self::Register => "register_button",
            Self::Invitation => "invitation_button",
            Self::ExportReady => "export_ready_button",
            Self::Published => "published_button",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value substituted into a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Text(String),
    Number(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Number(i64::from(value))
    }
}

/// Named values for one composition, keyed by parameter name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpolationBag {
    values: BTreeMap<String, ParamValue>,
}

impl InterpolationBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Who an email is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub display_name: Option<String>,
    /// Locale the recipient chose in their profile, used when the caller passes none
    pub preferred_locale: Option<String>,
}

impl Recipient {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            display_name: None,
            preferred_locale: None,
        }
    }

    pub fn with_name(email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            display_name: Some(display_name.into()),
            ..Self::new(email)
        }
    }

    pub fn preferring(mut self, locale: impl Into<String>) -> Self {
        self.preferred_locale = Some(locale.into());
        self
    }

    pub fn address(&self) -> EmailAddress {
        EmailAddress {
            email: self.email.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// Per-call data the body template needs besides translations
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub recipient: &'a Recipient,
    pub link: &'a str,
    /// Login only: the address already belongs to an account
    pub re_registration_attempt: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(recipient: &'a Recipient, link: &'a str) -> Self {
        Self {
            recipient,
            link,
            re_registration_attempt: false,
        }
    }
}

/// Fully rendered message, ready for the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposedMessage {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub recipient: EmailAddress,
}

impl ComposedMessage {
    pub fn into_email(self, from: EmailAddress) -> crate::domain::EmailMessage {
        crate::domain::EmailMessage::new(from, self.recipient, self.subject, self.html_body)
            .with_text_body(self.text_body)
    }
}
