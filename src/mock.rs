//! Mock engines for testing and offline use
//!
//! Provides a deterministic, network-free `EngineLoader` and
//! `TranslationEngine` so the selection logic can be exercised without model
//! downloads. The loader counts every load attempt.
//!
//! # Example
//!
//! ```ignore
//! use polyglot::mock::MockLoader;
//!
//! let loader = MockLoader::new().without_direct("en", "ko");
//! // en -> ko now falls back to the multilingual engine
//! ```

use crate::engine::{EngineLoader, EngineOutput, LanguagePair, TranslationEngine};
use crate::error::{EngineError, LoadError};
use crate::normalize::TRANSLATION_FIELD;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How a mock engine produces its translation.
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append the target code: "hello" → "hello_fr"
    Suffix,

    /// Look up (text, target code) → translation, falling back to `Suffix`
    Mappings(HashMap<(String, String), String>),

    /// Fail every call with this message
    Error(String),
}

/// Response shape a mock engine returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockShape {
    Text,
    Record,
    Records,
}

/// Deterministic translation engine.
#[derive(Debug, Clone)]
pub struct MockEngine {
    name: String,
    mode: MockMode,
    shape: MockShape,
    delay: Duration,
}

impl MockEngine {
    pub fn new(name: impl Into<String>, mode: MockMode) -> Self {
        Self {
            name: name.into(),
            mode,
            shape: MockShape::Records,
            delay: Duration::ZERO,
        }
    }

    pub fn suffix(name: impl Into<String>) -> Self {
        Self::new(name, MockMode::Suffix)
    }

    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, MockMode::Error(message.into()))
    }

    /// Add a fixed translation for `text` into `target`, switching to mapping mode.
    pub fn with_mapping(mut self, text: &str, target: &str, translation: &str) -> Self {
        let mut map = match self.mode {
            MockMode::Mappings(map) => map,
            _ => HashMap::new(),
        };
        map.insert(
            (text.to_string(), target.to_string()),
            translation.to_string(),
        );
        self.mode = MockMode::Mappings(map);
        self
    }

    pub fn with_shape(mut self, shape: MockShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn apply(&self, text: &str, target: &str) -> Result<String, EngineError> {
        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => Ok(map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", text, target))),
            MockMode::Error(msg) => Err(EngineError::Rejected(msg.clone())),
        }
    }

    fn shaped(&self, translation: String) -> EngineOutput {
        let record = || {
            let mut map = Map::new();
            map.insert(TRANSLATION_FIELD.to_string(), Value::String(translation.clone()));
            map
        };
        match self.shape {
            MockShape::Text => EngineOutput::Text(translation.clone()),
            MockShape::Record => EngineOutput::Record(record()),
            MockShape::Records => EngineOutput::Records(vec![record()]),
        }
    }
}

#[async_trait]
impl TranslationEngine for MockEngine {
    async fn translate(
        &self,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<EngineOutput, EngineError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let translation = self.apply(text, &pair.target)?;
        Ok(self.shaped(translation))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Engine loader with configurable failures and load-attempt counters.
#[derive(Debug, Default)]
pub struct MockLoader {
    missing_direct: HashSet<LanguagePair>,
    multilingual_fails: bool,
    direct_engine: Option<MockEngine>,
    multilingual_engine: Option<MockEngine>,
    load_delay: Duration,
    direct_attempts: AtomicUsize,
    multilingual_attempts: AtomicUsize,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the direct engine for `source -> target` unavailable.
    pub fn without_direct(mut self, source: &str, target: &str) -> Self {
        self.missing_direct.insert(LanguagePair::new(source, target));
        self
    }

    /// Make the multilingual engine unavailable.
    pub fn without_multilingual(mut self) -> Self {
        self.multilingual_fails = true;
        self
    }

    /// Engine handed out for every direct load.
    pub fn with_direct_engine(mut self, engine: MockEngine) -> Self {
        self.direct_engine = Some(engine);
        self
    }

    /// Engine handed out for the multilingual load.
    pub fn with_multilingual_engine(mut self, engine: MockEngine) -> Self {
        self.multilingual_engine = Some(engine);
        self
    }

    /// Simulated load latency.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn direct_attempts(&self) -> usize {
        self.direct_attempts.load(Ordering::SeqCst)
    }

    pub fn multilingual_attempts(&self) -> usize {
        self.multilingual_attempts.load(Ordering::SeqCst)
    }

    pub fn total_attempts(&self) -> usize {
        self.direct_attempts() + self.multilingual_attempts()
    }

    async fn simulate_load(&self) {
        if !self.load_delay.is_zero() {
            tokio::time::sleep(self.load_delay).await;
        }
    }
}

#[async_trait]
impl EngineLoader for MockLoader {
    async fn load_direct(
        &self,
        pair: &LanguagePair,
    ) -> Result<Arc<dyn TranslationEngine>, LoadError> {
        self.direct_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_load().await;

        let model = format!("mock/direct-{}-{}", pair.source, pair.target);
        if self.missing_direct.contains(pair) {
            return Err(LoadError::NotFound { model });
        }

        let engine = self
            .direct_engine
            .clone()
            .unwrap_or_else(|| MockEngine::suffix(model));
        Ok(Arc::new(engine))
    }

    async fn load_multilingual(&self) -> Result<Arc<dyn TranslationEngine>, LoadError> {
        self.multilingual_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_load().await;

        if self.multilingual_fails {
            return Err(LoadError::Other(
                "multilingual engine failed to load".to_string(),
            ));
        }

        let engine = self
            .multilingual_engine
            .clone()
            .unwrap_or_else(|| MockEngine::suffix("mock/multilingual"));
        Ok(Arc::new(engine))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn pair(source: &str, target: &str) -> LanguagePair {
        LanguagePair::new(source, target)
    }

    #[tokio::test]
    async fn test_suffix_translation() {
        let engine = MockEngine::suffix("mock");
        let output = engine.translate("hello", &pair("en", "fr")).await.unwrap();
        assert_eq!(normalize(output), "hello_fr");
    }

    #[tokio::test]
    async fn test_mapping_translation() {
        let engine = MockEngine::suffix("mock").with_mapping("Hello", "hi", "नमस्ते");
        let output = engine.translate("Hello", &pair("en", "hi")).await.unwrap();
        assert_eq!(normalize(output), "नमस्ते");

        // Unmapped text falls back to the suffix
        let output = engine.translate("Bye", &pair("en", "hi")).await.unwrap();
        assert_eq!(normalize(output), "Bye_hi");
    }

    #[tokio::test]
    async fn test_shapes() {
        for shape in [MockShape::Text, MockShape::Record, MockShape::Records] {
            let engine = MockEngine::suffix("mock").with_shape(shape);
            let output = engine.translate("a", &pair("en", "de")).await.unwrap();
            assert_eq!(normalize(output), "a_de");
        }
    }

    #[tokio::test]
    async fn test_error_mode() {
        let engine = MockEngine::failing("mock", "API unavailable");
        match engine.translate("hello", &pair("en", "fr")).await {
            Err(EngineError::Rejected(msg)) => assert_eq!(msg, "API unavailable"),
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loader_counts_attempts() {
        let loader = MockLoader::new().without_direct("en", "ko");

        assert!(loader.load_direct(&pair("en", "fr")).await.is_ok());
        assert!(loader.load_direct(&pair("en", "ko")).await.is_err());
        assert!(loader.load_multilingual().await.is_ok());

        assert_eq!(loader.direct_attempts(), 2);
        assert_eq!(loader.multilingual_attempts(), 1);
        assert_eq!(loader.total_attempts(), 3);
    }

    #[tokio::test]
    async fn test_loader_multilingual_failure() {
        let loader = MockLoader::new().without_multilingual();
        assert!(matches!(
            loader.load_multilingual().await,
            Err(LoadError::Other(_))
        ));
    }

    #[tokio::test]
    async fn test_default_engine_names() {
        let loader = MockLoader::new();
        let direct = loader.load_direct(&pair("en", "fr")).await.unwrap();
        let multilingual = loader.load_multilingual().await.unwrap();
        assert_eq!(direct.name(), "mock/direct-en-fr");
        assert_eq!(multilingual.name(), "mock/multilingual");
    }
}
