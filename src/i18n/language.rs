//! Language types: validated target languages and source selections.
//!
//! `Language` can only be constructed from a registry entry. `SourceLanguage`
//! adds the auto-detect pseudo-language, which is valid only as a source.

use crate::error::{Error, Result};
use crate::i18n::{LanguageConfig, LanguageRegistry};
use std::fmt;

/// Display name of the auto-detect pseudo-language.
pub const AUTO_DETECT_NAME: &str = "Auto Detect";

/// Code used for an auto-detected source until the selector substitutes the default.
pub const AUTO_DETECT_CODE: &str = "auto";

/// A validated language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "fr")
    code: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { code: "en" };

    /// Create a Language from its display name (e.g., "French").
    ///
    /// # Errors
    /// Returns `Error::UnknownLanguage` for names outside the supported set.
    pub fn from_name(name: &str) -> Result<Language> {
        let (code, _) = LanguageRegistry::get().resolve(name)?;
        Ok(Language { code })
    }

    /// Create a Language from its translation code (e.g., "fr").
    pub fn from_code(code: &str) -> Result<Language> {
        LanguageRegistry::get()
            .get_by_code(code)
            .map(|config| Language { code: config.code })
            .ok_or_else(|| Error::UnknownLanguage(code.to_string()))
    }

    /// Get the ISO 639-1 language code.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Get the full language configuration from the registry.
    ///
    /// # Panics
    /// Panics if the language code is not found in the registry. This should
    /// never happen if the Language was constructed properly.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_code(self.code)
            .expect("Language code should always be valid")
    }

    /// Get the display name of the language.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// Get the flag code of the language.
    pub fn flag_code(&self) -> &'static str {
        self.config().flag_code
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A source language selection: a concrete language or auto-detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    /// No explicit source; resolved to a fixed default code, not real detection
    AutoDetect,
    Fixed(Language),
}

impl SourceLanguage {
    /// Parse a source selection from its display name.
    pub fn from_name(name: &str) -> Result<SourceLanguage> {
        if name.trim().eq_ignore_ascii_case(AUTO_DETECT_NAME) {
            return Ok(SourceLanguage::AutoDetect);
        }
        Language::from_name(name).map(SourceLanguage::Fixed)
    }

    /// Code handed to the engine selector; auto-detect yields the `auto` marker.
    pub fn code(&self) -> &'static str {
        match self {
            SourceLanguage::AutoDetect => AUTO_DETECT_CODE,
            SourceLanguage::Fixed(language) => language.code(),
        }
    }

    /// Display name of the selection.
    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::AutoDetect => AUTO_DETECT_NAME,
            SourceLanguage::Fixed(language) => language.name(),
        }
    }

    /// Registry entry shown for this selection; auto-detect shows the default source.
    pub fn config(&self) -> &'static LanguageConfig {
        match self {
            SourceLanguage::AutoDetect => LanguageRegistry::get().default_source(),
            SourceLanguage::Fixed(language) => language.config(),
        }
    }
}

/// Parse a target language from its display name.
///
/// # Errors
/// `Error::AutoDetectTarget` if the name is the auto-detect pseudo-language,
/// `Error::UnknownLanguage` for anything else outside the supported set.
pub fn target_from_name(name: &str) -> Result<Language> {
    if name.trim().eq_ignore_ascii_case(AUTO_DETECT_NAME) {
        return Err(Error::AutoDetectTarget);
    }
    Language::from_name(name)
}

/// Swap source and target selections.
///
/// # Errors
/// `Error::AutoDetectTarget` if the source is auto-detect, since it would
/// become the target.
pub fn swap(source: SourceLanguage, target: Language) -> Result<(SourceLanguage, Language)> {
    match source {
        SourceLanguage::AutoDetect => Err(Error::AutoDetectTarget),
        SourceLanguage::Fixed(language) => Ok((SourceLanguage::Fixed(target), language)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_french() {
        let language = Language::from_name("French").expect("Should succeed");
        assert_eq!(language.code(), "fr");
        assert_eq!(language.name(), "French");
        assert_eq!(language.flag_code(), "fr");
    }

    #[test]
    fn test_from_name_unknown() {
        let result = Language::from_name("Portuguese");
        assert!(matches!(result, Err(Error::UnknownLanguage(_))));
    }

    #[test]
    fn test_from_code_roundtrips_name() {
        let language = Language::from_code("ja").expect("Should succeed");
        assert_eq!(language, Language::from_name("Japanese").unwrap());
        assert!(Language::from_code("").is_err());
    }

    #[test]
    fn test_english_constant() {
        assert_eq!(Language::ENGLISH.code(), "en");
        assert_eq!(Language::ENGLISH.to_string(), "English");
    }

    #[test]
    fn test_source_auto_detect() {
        let source = SourceLanguage::from_name("Auto Detect").unwrap();
        assert_eq!(source, SourceLanguage::AutoDetect);
        assert_eq!(source.code(), AUTO_DETECT_CODE);
        assert_eq!(source.config().flag_code, "gb");
    }

    #[test]
    fn test_source_fixed() {
        let source = SourceLanguage::from_name("Hindi").unwrap();
        assert_eq!(source.code(), "hi");
        assert_eq!(source.name(), "Hindi");
    }

    #[test]
    fn test_target_rejects_auto_detect() {
        assert!(matches!(
            target_from_name("auto detect"),
            Err(Error::AutoDetectTarget)
        ));
    }

    #[test]
    fn test_swap_fixed_languages() {
        let french = Language::from_name("French").unwrap();
        let german = Language::from_name("German").unwrap();

        let (source, target) = swap(SourceLanguage::Fixed(french), german).unwrap();
        assert_eq!(source, SourceLanguage::Fixed(german));
        assert_eq!(target, french);
    }

    #[test]
    fn test_swap_auto_detect_fails() {
        let result = swap(SourceLanguage::AutoDetect, Language::ENGLISH);
        assert!(matches!(result, Err(Error::AutoDetectTarget)));
    }
}
