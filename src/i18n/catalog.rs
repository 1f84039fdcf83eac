//! Translation catalog and locale resolution

use super::keys;
use crate::domain::MessageKind;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Locale files compiled into the binary
const EMBEDDED_LOCALES: &[(&str, &str)] = &[
    ("de", include_str!("lang/de.json")),
    ("en", include_str!("lang/en.json")),
    ("fr", include_str!("lang/fr.json")),
];

/// Locale used when configuration does not name one
pub const DEFAULT_LOCALE: &str = "en";

/// Catalog loading errors; all of them are fatal at startup
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse translations for '{locale}': {source}")]
    Parse {
        locale: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Default locale '{0}' is not in the catalog")]
    MissingDefault(String),

    #[error("Default locale '{locale}' is missing keys: {}", missing.join(", "))]
    IncompleteDefault { locale: String, missing: Vec<String> },

    #[error("Locale '{0}' is defined twice")]
    Duplicate(String),
}

/// Normalize a requested locale code for lookup: trimmed, ASCII lowercase.
pub fn normalize_locale(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// Every key a message may need. The default locale must define all of them.
pub fn required_keys() -> Vec<&'static str> {
    let mut required = keys::COMMON.to_vec();
    for kind in MessageKind::all() {
        required.extend([kind.title_key(), kind.info_key(), kind.button_key()]);
    }
    required
}

/// Translations for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSet {
    code: String,
    entries: HashMap<String, String>,
}

impl TranslationSet {
    pub fn new<I, K, V>(code: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            code: normalize_locale(&code.into()),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a flat `{"key": "value"}` JSON document
    pub fn from_json(code: &str, json: &str) -> Result<Self, CatalogError> {
        let entries: HashMap<String, String> =
            serde_json::from_str(json).map_err(|source| CatalogError::Parse {
                locale: code.to_string(),
                source,
            })?;
        Ok(Self::new(code, entries))
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn missing_keys(&self) -> Vec<String> {
        required_keys()
            .into_iter()
            .filter(|key| !self.entries.contains_key(*key))
            .map(str::to_string)
            .collect()
    }
}

/// All locales known to the process. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct TranslationCatalog {
    sets: BTreeMap<String, TranslationSet>,
    default_code: String,
}

impl TranslationCatalog {
    /// Build a catalog, checking that the default locale exists and is complete.
    ///
    /// Other locales may be partial; missing keys fall back to the default at
    /// composition time and are reported here once.
    pub fn new<I>(sets: I, default_code: &str) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = TranslationSet>,
    {
        let default_code = normalize_locale(default_code);
        let mut by_code = BTreeMap::new();
        for set in sets {
            let code = set.code.clone();
            if by_code.insert(code.clone(), set).is_some() {
                return Err(CatalogError::Duplicate(code));
            }
        }

        let default = by_code
            .get(&default_code)
            .ok_or_else(|| CatalogError::MissingDefault(default_code.clone()))?;

        let missing = default.missing_keys();
        if !missing.is_empty() {
            return Err(CatalogError::IncompleteDefault {
                locale: default_code,
                missing,
            });
        }

        for set in by_code.values().filter(|s| s.code != default_code) {
            let missing = set.missing_keys();
            if !missing.is_empty() {
                tracing::warn!(
                    locale = %set.code,
                    missing = ?missing,
                    "Locale is incomplete, missing keys fall back to '{}'",
                    default_code
                );
            }
        }

        Ok(Self {
            sets: by_code,
            default_code,
        })
    }

    /// Load the locales embedded in the binary
    pub fn embedded(default_code: &str) -> Result<Self, CatalogError> {
        let sets = EMBEDDED_LOCALES
            .iter()
            .map(|(code, json)| TranslationSet::from_json(code, json))
            .collect::<Result<Vec<_>, _>>()?;

        let catalog = Self::new(sets, default_code)?;
        tracing::debug!(
            locales = ?catalog.supported_locales(),
            default = %catalog.default_code,
            "Translation catalog loaded"
        );
        Ok(catalog)
    }

    pub fn get(&self, code: &str) -> Option<&TranslationSet> {
        self.sets.get(&normalize_locale(code))
    }

    pub fn is_supported(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Resolve a requested locale; unknown or absent codes yield the default set.
    pub fn resolve(&self, requested: Option<&str>) -> &TranslationSet {
        match requested.and_then(|code| self.get(code)) {
            Some(set) => set,
            None => {
                if let Some(code) = requested {
                    tracing::debug!(requested = %code, "Unsupported locale, using default");
                }
                self.default_set()
            }
        }
    }

    pub fn default_set(&self) -> &TranslationSet {
        // Presence is checked in `new`
        &self.sets[&self.default_code]
    }

    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    /// Supported locale codes in sorted order
    pub fn supported_locales(&self) -> Vec<&str> {
        self.sets.keys().map(String::as_str).collect()
    }
}
