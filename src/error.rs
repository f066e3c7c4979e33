use crate::engine::LanguagePair;
use std::time::Duration;
use thiserror::Error;

/// Why a single engine acquisition attempt failed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model '{model}' not found")]
    NotFound { model: String },

    #[error("model hub returned {status} for '{model}': {body}")]
    Http {
        model: String,
        status: u16,
        body: String,
    },

    #[error("network error while loading '{model}': {reason}")]
    Network { model: String, reason: String },

    #[error("loading '{model}' timed out after {timeout:?}")]
    TimedOut { model: String, timeout: Duration },

    #[error("{0}")]
    Other(String),
}

impl LoadError {
    /// Whether retrying the same request could succeed (5xx, 429, network).
    pub fn is_transient(&self) -> bool {
        match self {
            LoadError::Http { status, .. } => *status == 429 || *status >= 500,
            LoadError::Network { .. } => true,
            _ => false,
        }
    }
}

/// Why a bound engine failed while translating.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("inference API returned {status}: {body}")]
    Http { status: u16, body: String },

    /// 503 while the model loads, with the wait the API estimated
    #[error("model is loading, estimated ready in {wait:?}")]
    ModelLoading { wait: Duration },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected engine response: {0}")]
    Decode(String),

    #[error("engine call timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Rejected(String),
}

impl EngineError {
    /// 503 is what the inference API returns while a model is warming up.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Http { status, .. } => *status == 429 || *status >= 500,
            EngineError::ModelLoading { .. } | EngineError::Network(_) => true,
            _ => false,
        }
    }
}

/// Errors surfaced at the translation request boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("text to translate is empty")]
    EmptyText,

    #[error("temperature {0} is outside [0.0, 1.0]")]
    InvalidTemperature(f32),

    #[error("unknown language: '{0}'")]
    UnknownLanguage(String),

    #[error("auto-detect can only be used as a source language")]
    AutoDetectTarget,

    #[error("no translation engine available for {pair} (direct: {direct}; fallback: {fallback})")]
    EngineUnavailable {
        pair: LanguagePair,
        direct: LoadError,
        fallback: LoadError,
    },

    #[error("translation {pair} failed in {engine}: {source}")]
    TranslationFailed {
        pair: LanguagePair,
        engine: String,
        source: EngineError,
    },
}

impl Error {
    /// Input problems the user should fix, shown as a warning rather than a failure.
    pub fn is_user_warning(&self) -> bool {
        matches!(self, Error::EmptyText | Error::InvalidTemperature(_))
    }

    /// Only invocation failures are worth retrying; a pair with no engine stays that way.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::TranslationFailed { .. })
    }

    /// Message suitable for showing to the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            Error::EmptyText => "Please enter some text.".to_string(),
            Error::InvalidTemperature(t) => {
                format!("Temperature must be between 0.0 and 1.0 (got {}).", t)
            }
            Error::UnknownLanguage(name) => format!("'{}' is not a supported language.", name),
            Error::AutoDetectTarget => {
                "Auto Detect can only be chosen as the source language.".to_string()
            }
            Error::EngineUnavailable { pair, .. } => format!(
                "Model loading failed for {}. No translation engine is available for this pair.",
                pair
            ),
            Error::TranslationFailed { pair, .. } => format!(
                "Translation {} failed. Please try again, or adjust the text or settings.",
                pair
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
