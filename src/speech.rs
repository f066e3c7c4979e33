//! Speech synthesis for translated text.
//!
//! `GoogleTts` talks to the Google Translate TTS endpoint, which returns MP3 and
//! accepts at most `MAX_CHUNK_CHARS` characters per request. Longer text is split
//! at whitespace and the MP3 chunks are concatenated.

use crate::config::Config;
use crate::retry::{with_retry_if, Retry, RetryConfig};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Longest text the TTS endpoint accepts in one request.
pub const MAX_CHUNK_CHARS: usize = 200;

/// Translation codes the TTS service can speak, with the code it expects.
const SPEECH_LANGUAGES: &[(&str, &str)] = &[
    ("en", "en"),
    ("hi", "hi"),
    ("fr", "fr"),
    ("es", "es"),
    ("de", "de"),
    ("it", "it"),
    ("zh", "zh-CN"),
    ("ja", "ja"),
    ("ko", "ko"),
];

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("nothing to speak")]
    EmptyText,

    #[error("speech synthesis is not enabled")]
    Disabled,

    #[error("speech service returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error during speech synthesis: {0}")]
    Network(String),
}

impl SpeechError {
    fn is_transient(&self) -> bool {
        match self {
            SpeechError::Http { status, .. } => *status == 429 || *status >= 500,
            SpeechError::Network(_) => true,
            SpeechError::EmptyText | SpeechError::Disabled => false,
        }
    }
}

/// Turns text into audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` spoken in `language_code`; returns MP3 bytes.
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Code sent to the TTS service for a translation code.
///
/// Languages outside the supported set use `fallback`.
pub fn speech_language(code: &str, fallback: &str) -> &'static str {
    let lookup = |code: &str| {
        SPEECH_LANGUAGES
            .iter()
            .find(|(translation_code, _)| *translation_code == code)
            .map(|(_, speech_code)| *speech_code)
    };
    lookup(code).or_else(|| lookup(fallback)).unwrap_or("en")
}

/// Split text into chunks of at most `max_chars` characters, breaking at whitespace.
///
/// Words longer than `max_chars` are split mid-word.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        } else {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Google Translate TTS client.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    endpoint: String,
    fallback_code: String,
    retry: RetryConfig,
}

impl GoogleTts {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            endpoint: format!("{}/translate_tts", config.tts_url.trim_end_matches('/')),
            fallback_code: config.speech_fallback_code.clone(),
            retry: RetryConfig::inference(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        language: &str,
        idx: usize,
        total: usize,
    ) -> Result<Vec<u8>, SpeechError> {
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        with_retry_if(
            &self.retry,
            &format!("Speech chunk {}/{}", idx, total),
            || async {
                let response = self
                    .client
                    .get(&self.endpoint)
                    .query(&[
                        ("ie", "UTF-8"),
                        ("q", chunk),
                        ("tl", language),
                        ("client", "tw-ob"),
                        ("idx", idx.as_str()),
                        ("total", total.as_str()),
                        ("textlen", textlen.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| SpeechError::Network(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(SpeechError::Http {
                        status: status.as_u16(),
                        body,
                    });
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| SpeechError::Network(e.to_string()))?;
                Ok(bytes.to_vec())
            },
            |e: &SpeechError| Retry::on(e.is_transient()),
        )
        .await
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<Vec<u8>, SpeechError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let language = speech_language(language_code, &self.fallback_code);
        debug!(
            "Synthesizing {} chunk(s) of speech in {}",
            chunks.len(),
            language
        );

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, language, idx, chunks.len()).await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}
