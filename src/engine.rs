//! Translation engine abstraction.
//!
//! An `EngineLoader` acquires engines: either a direct engine trained for one
//! language pair, or the shared multilingual engine that takes explicit source
//! and target codes on every call. A `TranslationEngine` turns text into a raw
//! `EngineOutput`, which `normalize` reduces to a single string.

use crate::error::{EngineError, LoadError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A resolved (source code, target code) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// Which path produced the binding for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Source equals target; text is returned unchanged
    Identity,
    /// A pair-specific engine was loaded
    Direct,
    /// The shared multilingual engine was used
    MultilingualFallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Identity => "identity",
            Strategy::Direct => "direct",
            Strategy::MultilingualFallback => "multilingual-fallback",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response shapes an engine may return.
///
/// Decoded from JSON by shape: a string, an object, or an array of objects.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EngineOutput {
    Text(String),
    Record(serde_json::Map<String, serde_json::Value>),
    Records(Vec<serde_json::Map<String, serde_json::Value>>),
}

/// A loaded engine capable of translating text.
#[async_trait]
pub trait TranslationEngine: Send + Sync {
    /// Translate `text` for `pair`.
    ///
    /// Direct engines already know their pair and may ignore it; the
    /// multilingual engine needs the explicit codes.
    async fn translate(&self, text: &str, pair: &LanguagePair)
        -> Result<EngineOutput, EngineError>;

    /// Name used in logs and errors (usually the model id).
    fn name(&self) -> &str;
}

/// Acquires translation engines.
#[async_trait]
pub trait EngineLoader: Send + Sync {
    /// Load the engine trained specifically for `pair`.
    async fn load_direct(
        &self,
        pair: &LanguagePair,
    ) -> Result<Arc<dyn TranslationEngine>, LoadError>;

    /// Load the shared multilingual engine.
    async fn load_multilingual(&self) -> Result<Arc<dyn TranslationEngine>, LoadError>;
}
