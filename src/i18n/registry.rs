//! Language registry: Single source of truth for all supported languages.
//!
//! This module provides a centralized registry of all languages the translator
//! accepts. It uses a singleton pattern with `OnceLock` to ensure thread-safe
//! initialization and access.
//!
//! The registry is strict: a display name that is not in the supported set is an
//! error, never silently mapped to a default code.

use crate::error::{Error, Result};
use serde::Serialize;
use std::sync::OnceLock;

/// Base URL for flag images, keyed by flag code.
const FLAG_CDN_URL: &str = "https://flagcdn.com/w40";

/// Configuration for a supported language.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageConfig {
    /// Human-readable display name (e.g., "French")
    pub name: &'static str,

    /// ISO 639-1 code used to address translation engines (e.g., "fr")
    pub code: &'static str,

    /// Country code used for the flag image only (e.g., "fr", "gb")
    pub flag_code: &'static str,

    /// Whether this language is the default used when the source is auto-detected
    pub is_default_source: bool,
}

impl LanguageConfig {
    /// URL of the flag image for this language.
    pub fn flag_url(&self) -> String {
        format!("{}/{}.png", FLAG_CDN_URL, self.flag_code)
    }
}

/// Global language registry singleton.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

/// Global registry instance (initialized lazily)
static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global language registry instance.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Resolve a display name to its `(translation code, flag code)` pair.
    ///
    /// # Errors
    /// Returns `Error::UnknownLanguage` if the name is not a supported language.
    /// The auto-detect pseudo-language is not a registry entry and is rejected
    /// here as well; see `SourceLanguage` for how it is handled.
    pub fn resolve(&self, name: &str) -> Result<(&'static str, &'static str)> {
        self.get_by_name(name)
            .map(|lang| (lang.code, lang.flag_code))
            .ok_or_else(|| Error::UnknownLanguage(name.to_string()))
    }

    /// Get a language configuration by its display name (case-insensitive).
    pub fn get_by_name(&self, name: &str) -> Option<&LanguageConfig> {
        let name = name.trim();
        self.languages
            .iter()
            .find(|lang| lang.name.eq_ignore_ascii_case(name))
    }

    /// Get a language configuration by its translation code.
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Get all supported languages, in display order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }

    /// Get the language substituted for an auto-detected source.
    ///
    /// # Panics
    /// Panics if the registry does not define exactly one default source
    /// language (this indicates a configuration error).
    pub fn default_source(&self) -> &LanguageConfig {
        let defaults: Vec<_> = self
            .languages
            .iter()
            .filter(|lang| lang.is_default_source)
            .collect();

        match defaults.len() {
            0 => panic!("No default source language found in registry"),
            1 => defaults[0],
            _ => panic!("Multiple default source languages found in registry"),
        }
    }
}

/// The fixed set of supported languages.
fn default_languages() -> Vec<LanguageConfig> {
    let entry = |name, code, flag_code| LanguageConfig {
        name,
        code,
        flag_code,
        is_default_source: code == "en",
    };

    vec![
        entry("English", "en", "gb"),
        entry("Hindi", "hi", "in"),
        entry("French", "fr", "fr"),
        entry("Spanish", "es", "es"),
        entry("German", "de", "de"),
        entry("Italian", "it", "it"),
        entry("Chinese", "zh", "cn"),
        entry("Japanese", "ja", "jp"),
        entry("Korean", "ko", "kr"),
    ]
}
