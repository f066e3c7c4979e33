//! Translation request boundary.
//!
//! Validates raw input, resolves the language selections, runs the selected
//! binding, and attaches the display-only extras (confidence, flags, speech).
//! Speech failures never fail a request; they become a warning next to the
//! translated text.

use crate::config::Config;
use crate::confidence;
use crate::engine::Strategy;
use crate::error::{Error, Result};
use crate::huggingface::HubLoader;
use crate::i18n::{target_from_name, Language, LanguageRegistry, SourceLanguage};
use crate::selector::{EngineSelector, SelectorOptions};
use crate::speech::{GoogleTts, SpeechError, SpeechSynthesizer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

/// A translation request as submitted by a user.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslationRequest {
    pub text: String,
    /// Display name of the source language, or "Auto Detect"
    pub source: String,
    /// Display name of the target language
    pub target: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_true")]
    pub show_confidence: bool,
    #[serde(default)]
    pub speak: bool,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: &str, target: &str) -> Self {
        Self {
            text: text.into(),
            source: source.to_string(),
            target: target.to_string(),
            temperature: default_temperature(),
            show_confidence: true,
            speak: false,
        }
    }

    /// Reject input that must never reach the engine selector.
    pub fn validate(&self) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(Error::EmptyText);
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::InvalidTemperature(self.temperature));
        }
        Ok(())
    }
}

/// A language as shown next to the result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LanguageSummary {
    pub name: String,
    pub code: String,
    pub flag_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranslationResponse {
    pub translation: String,
    pub strategy: Strategy,
    pub engine: String,
    pub source: LanguageSummary,
    pub target: LanguageSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip)]
    pub audio: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_warning: Option<String>,
}

/// Serves translation requests on top of an engine selector.
pub struct TranslationService {
    selector: EngineSelector,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
}

impl TranslationService {
    pub fn new(selector: EngineSelector, speech: Option<Arc<dyn SpeechSynthesizer>>) -> Self {
        Self { selector, speech }
    }

    /// Build the service with the Hugging Face backend and Google TTS.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        let loader = HubLoader::new(client.clone(), config);
        let selector = EngineSelector::new(Arc::new(loader), SelectorOptions::from(config));
        let speech: Arc<dyn SpeechSynthesizer> = Arc::new(GoogleTts::new(client, config));
        Self::new(selector, Some(speech))
    }

    pub fn selector(&self) -> &EngineSelector {
        &self.selector
    }

    /// Translate one request.
    ///
    /// # Errors
    /// - `EmptyText` / `InvalidTemperature` before any engine is touched
    /// - `UnknownLanguage` / `AutoDetectTarget` for bad selections
    /// - `EngineUnavailable` if no engine could be loaded for the pair
    /// - `TranslationFailed` if the bound engine failed (retryable)
    pub async fn translate(&self, request: &TranslationRequest) -> Result<TranslationResponse> {
        request.validate()?;

        let source = SourceLanguage::from_name(&request.source)?;
        let target = target_from_name(&request.target)?;

        info!("Translating {} -> {}", source.name(), target.name());

        let binding = self.selector.select(source.code(), target.code()).await?;
        let translation = binding.translate(&request.text).await?;

        info!(
            "Translated {} with {} ({})",
            binding.pair(),
            binding.engine_name(),
            binding.strategy()
        );

        let confidence = request
            .show_confidence
            .then(|| confidence::estimate(request.temperature));

        let (audio, speech_warning) = if request.speak {
            match self.speak(&translation, target.code()).await {
                Ok(audio) => (Some(audio), None),
                Err(e) => {
                    warn!("Speech synthesis failed for {}: {}", binding.pair(), e);
                    (None, Some(format!("TTS failed: {}", e)))
                }
            }
        } else {
            (None, None)
        };

        Ok(TranslationResponse {
            source: source_summary(source, &binding.pair().source),
            target: target_summary(target),
            engine: binding.engine_name().to_string(),
            strategy: binding.strategy(),
            translation,
            confidence,
            audio,
            speech_warning,
        })
    }

    /// Synthesize speech for text in a translation code.
    pub async fn speak(
        &self,
        text: &str,
        language_code: &str,
    ) -> std::result::Result<Vec<u8>, SpeechError> {
        match &self.speech {
            Some(speech) => speech.synthesize(text, language_code).await,
            None => Err(SpeechError::Disabled),
        }
    }
}

/// Auto-detect shows the flag of the code it resolved to.
fn source_summary(source: SourceLanguage, resolved_code: &str) -> LanguageSummary {
    let config = LanguageRegistry::get()
        .get_by_code(resolved_code)
        .unwrap_or_else(|| source.config());
    LanguageSummary {
        name: source.name().to_string(),
        code: resolved_code.to_string(),
        flag_url: config.flag_url(),
    }
}

fn target_summary(target: Language) -> LanguageSummary {
    LanguageSummary {
        name: target.name().to_string(),
        code: target.code().to_string(),
        flag_url: target.config().flag_url(),
    }
}
