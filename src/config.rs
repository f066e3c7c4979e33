use crate::i18n::LanguageRegistry;
use anyhow::{bail, Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Hugging Face
    pub hf_inference_url: String,
    pub hf_hub_url: String,
    pub hf_api_token: Option<String>,

    // Engine selection
    pub direct_model_namespace: String,
    pub multilingual_model: String,
    pub default_source_code: String,
    pub max_length: u32,
    pub engine_load_timeout_secs: u64,
    pub translate_timeout_secs: u64,

    // Speech synthesis
    pub tts_url: String,
    pub speech_fallback_code: String,

    // Server
    pub api_key: Option<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            // Hugging Face
            hf_inference_url: std::env::var("HF_INFERENCE_URL")
                .unwrap_or_else(|_| "https://api-inference.huggingface.co".to_string()),
            hf_hub_url: std::env::var("HF_HUB_URL")
                .unwrap_or_else(|_| "https://huggingface.co".to_string()),
            hf_api_token: std::env::var("HF_API_TOKEN").ok().filter(|t| !t.is_empty()),

            // Engine selection
            direct_model_namespace: std::env::var("DIRECT_MODEL_NAMESPACE")
                .unwrap_or_else(|_| "Helsinki-NLP/opus-mt".to_string()),
            multilingual_model: std::env::var("MULTILINGUAL_MODEL")
                .unwrap_or_else(|_| "facebook/m2m100_418M".to_string()),
            default_source_code: std::env::var("DEFAULT_SOURCE_CODE")
                .unwrap_or_else(|_| "en".to_string()),
            max_length: parse_or("MAX_LENGTH", 512)?,
            engine_load_timeout_secs: parse_or("ENGINE_LOAD_TIMEOUT_SECS", 60)?,
            translate_timeout_secs: parse_or("TRANSLATE_TIMEOUT_SECS", 120)?,

            // Speech synthesis
            tts_url: std::env::var("TTS_URL")
                .unwrap_or_else(|_| "https://translate.google.com".to_string()),
            speech_fallback_code: std::env::var("SPEECH_FALLBACK_CODE")
                .unwrap_or_else(|_| "en".to_string()),

            // Server
            api_key: std::env::var("API_KEY").ok().filter(|k| !k.is_empty()),
            port: parse_or("PORT", 8080)?,
        };

        if LanguageRegistry::get()
            .get_by_code(&config.default_source_code)
            .is_none()
        {
            bail!(
                "DEFAULT_SOURCE_CODE '{}' is not a supported language code",
                config.default_source_code
            );
        }

        Ok(config)
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        Self {
            hf_inference_url: "http://127.0.0.1:9".to_string(),
            hf_hub_url: "http://127.0.0.1:9".to_string(),
            hf_api_token: None,
            direct_model_namespace: "Helsinki-NLP/opus-mt".to_string(),
            multilingual_model: "facebook/m2m100_418M".to_string(),
            default_source_code: "en".to_string(),
            max_length: 512,
            engine_load_timeout_secs: 60,
            translate_timeout_secs: 120,
            tts_url: "http://127.0.0.1:9".to_string(),
            speech_fallback_code: "en".to_string(),
            api_key: None,
            port: 8080,
        }
    }
}

/// Parse an optional numeric variable; a set but malformed value is an error.
fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a number, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}
