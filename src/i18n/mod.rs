//! Localization: the translation catalog and locale resolution
//!
//! Locale files live in `lang/<code>.json` as flat key → string maps. Values may
//! contain `{{param}}` placeholders which the composer fills from the
//! interpolation bag.

pub mod catalog;

pub use catalog::{
    normalize_locale, required_keys, CatalogError, TranslationCatalog, TranslationSet,
    DEFAULT_LOCALE,
};

/// Translation keys shared by every message kind
pub mod keys {
    pub const SALUTATION: &str = "salutation";
    pub const SALUTATION_ANONYMOUS: &str = "salutation_anonymous";
    pub const LINK_HINT: &str = "link_hint";
    pub const FOOTER: &str = "footer";
    pub const LOGIN_RE_REGISTRATION_INFO: &str = "login_re_registration_info";

    pub const COMMON: &[&str] = &[
        SALUTATION,
        SALUTATION_ANONYMOUS,
        LINK_HINT,
        FOOTER,
        LOGIN_RE_REGISTRATION_INFO,
    ];
}
