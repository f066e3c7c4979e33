//! Supported languages and their identifiers.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth mapping display names to translation
//!   codes and flag codes
//! - `language`: Validated `Language` and `SourceLanguage` (with auto-detect)
//!
//! # Example
//!
//! ```rust,ignore
//! use polyglot::i18n::{Language, LanguageRegistry, SourceLanguage};
//!
//! let (code, flag) = LanguageRegistry::get().resolve("French")?;
//! let source = SourceLanguage::from_name("Auto Detect")?;
//! let target = Language::from_name("Hindi")?;
//! ```

mod language;
mod registry;

pub use language::{
    swap, target_from_name, Language, SourceLanguage, AUTO_DETECT_CODE, AUTO_DETECT_NAME,
};
pub use registry::{LanguageConfig, LanguageRegistry};
