// Library exports for the binaries and integration tests

pub mod confidence;
pub mod config;
pub mod engine;
pub mod error;
pub mod huggingface;
pub mod i18n;
pub mod mock;
pub mod normalize;
pub mod retry;
pub mod security;
pub mod selector;
pub mod server;
pub mod service;
pub mod speech;

pub use engine::{EngineLoader, EngineOutput, LanguagePair, Strategy, TranslationEngine};
pub use error::{EngineError, Error, LoadError, Result};
pub use selector::{Binding, EngineSelector, SelectorOptions};
pub use service::{TranslationRequest, TranslationResponse, TranslationService};
