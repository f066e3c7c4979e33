//! Translation engine selection with a per-pair binding cache.
//!
//! For a resolved pair the selector decides, in order:
//!
//! 1. an auto-detected source becomes the default source code (no detection
//!    is performed)
//! 2. source == target binds `Strategy::Identity`; nothing is loaded
//! 3. the direct pair-specific engine is tried, then the shared multilingual
//!    engine
//! 4. if both attempts fail the request fails with `Error::EngineUnavailable`
//!    carrying both causes, or with `Error::TranslationFailed` when a load
//!    ran past `load_timeout`
//!
//! Successful bindings are cached for the lifetime of the selector and never
//! replaced. Each pair has its own `OnceCell`, so concurrent requests for the
//! same pair wait on a single load. Failed loads are not cached.

use crate::config::Config;
use crate::engine::{EngineLoader, LanguagePair, Strategy, TranslationEngine};
use crate::error::{EngineError, Error, LoadError, Result};
use crate::i18n::AUTO_DETECT_CODE;
use crate::normalize::normalize;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

/// Tunables for engine selection.
#[derive(Debug, Clone)]
pub struct SelectorOptions {
    /// Code substituted for an auto-detected source
    pub default_source: String,
    /// Upper bound on a single engine load attempt
    pub load_timeout: Duration,
    /// Upper bound on a single translation call
    pub translate_timeout: Duration,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            default_source: "en".to_string(),
            load_timeout: Duration::from_secs(60),
            translate_timeout: Duration::from_secs(120),
        }
    }
}

impl From<&Config> for SelectorOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_source: config.default_source_code.clone(),
            load_timeout: Duration::from_secs(config.engine_load_timeout_secs),
            translate_timeout: Duration::from_secs(config.translate_timeout_secs),
        }
    }
}

/// A pair bound to the engine that translates it.
pub struct Binding {
    pair: LanguagePair,
    strategy: Strategy,
    engine: Option<Arc<dyn TranslationEngine>>,
    timeout: Duration,
}

impl Binding {
    fn identity(pair: LanguagePair) -> Self {
        Self {
            pair,
            strategy: Strategy::Identity,
            engine: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn engine_name(&self) -> &str {
        self.engine
            .as_deref()
            .map(|engine| engine.name())
            .unwrap_or("identity")
    }

    /// Translate `text` with the bound engine and normalize the response.
    ///
    /// Identity bindings return the input unchanged.
    ///
    /// # Errors
    /// `Error::TranslationFailed` if the engine errors or exceeds the timeout.
    pub async fn translate(&self, text: &str) -> Result<String> {
        let Some(engine) = self.engine.as_deref() else {
            return Ok(text.to_string());
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, engine.translate(text, &self.pair)).await;

        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(self.failed(engine, e)),
            Err(_) => return Err(self.failed(engine, EngineError::TimedOut(self.timeout))),
        };

        debug!(
            "Translated {} chars for {} with {} in {:?}",
            text.chars().count(),
            self.pair,
            engine.name(),
            started.elapsed()
        );

        Ok(normalize(output))
    }

    fn failed(&self, engine: &dyn TranslationEngine, source: EngineError) -> Error {
        error!(
            "Translation {} failed in {}: {}",
            self.pair,
            engine.name(),
            source
        );
        Error::TranslationFailed {
            pair: self.pair.clone(),
            engine: engine.name().to_string(),
            source,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("pair", &self.pair)
            .field("strategy", &self.strategy)
            .field("engine", &self.engine_name())
            .finish()
    }
}

/// Chooses and caches engine bindings per language pair.
pub struct EngineSelector {
    loader: Arc<dyn EngineLoader>,
    options: SelectorOptions,
    bindings: Mutex<HashMap<LanguagePair, Arc<OnceCell<Arc<Binding>>>>>,
    multilingual: OnceCell<Arc<dyn TranslationEngine>>,
}

impl EngineSelector {
    pub fn new(loader: Arc<dyn EngineLoader>, options: SelectorOptions) -> Self {
        Self {
            loader,
            options,
            bindings: Mutex::new(HashMap::new()),
            multilingual: OnceCell::new(),
        }
    }

    /// Apply the auto-detect substitution to a pair of codes.
    pub fn resolve_pair(&self, source_code: &str, target_code: &str) -> LanguagePair {
        let source = if source_code == AUTO_DETECT_CODE {
            self.options.default_source.as_str()
        } else {
            source_code
        };
        LanguagePair::new(source, target_code)
    }

    /// Get the binding for a pair, loading an engine on first use.
    ///
    /// # Errors
    /// `Error::EngineUnavailable` if neither the direct nor the multilingual
    /// engine could be loaded.
    pub async fn select(&self, source_code: &str, target_code: &str) -> Result<Arc<Binding>> {
        let pair = self.resolve_pair(source_code, target_code);

        if pair.is_identity() {
            return Ok(Arc::new(Binding::identity(pair)));
        }

        let cell = {
            let mut bindings = self.bindings.lock().await;
            Arc::clone(bindings.entry(pair.clone()).or_default())
        };

        if let Some(binding) = cell.get() {
            debug!("Reusing {} binding for {}", binding.strategy, pair);
            return Ok(Arc::clone(binding));
        }

        let binding = cell.get_or_try_init(|| self.bind(pair)).await?;
        Ok(Arc::clone(binding))
    }

    /// Pairs with a cached binding.
    pub async fn cached_pairs(&self) -> Vec<LanguagePair> {
        let bindings = self.bindings.lock().await;
        bindings
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    async fn bind(&self, pair: LanguagePair) -> Result<Arc<Binding>> {
        info!("Loading translation engine for {}", pair);

        let direct = self
            .load_with_timeout(
                format!("direct engine for {}", pair),
                self.loader.load_direct(&pair),
            )
            .await;

        let direct_error = match direct {
            Ok(engine) => {
                info!("Bound direct engine {} for {}", engine.name(), pair);
                return Ok(Arc::new(self.binding(pair, Strategy::Direct, engine)));
            }
            Err(e) => {
                warn!(
                    "Direct engine unavailable for {} ({}), trying multilingual engine",
                    pair, e
                );
                e
            }
        };

        match self.multilingual_engine().await {
            Ok(engine) => {
                info!("Bound multilingual engine {} for {}", engine.name(), pair);
                Ok(Arc::new(self.binding(
                    pair,
                    Strategy::MultilingualFallback,
                    engine,
                )))
            }
            Err(fallback_error) => {
                error!(
                    "No engine available for {}: direct: {}; fallback: {}",
                    pair, direct_error, fallback_error
                );

                // An expired load is retryable, unlike a missing engine.
                let expired = [&fallback_error, &direct_error]
                    .into_iter()
                    .find_map(|e| match e {
                        LoadError::TimedOut { model, timeout } => Some((model.clone(), *timeout)),
                        _ => None,
                    });
                if let Some((engine, timeout)) = expired {
                    return Err(Error::TranslationFailed {
                        pair,
                        engine,
                        source: EngineError::TimedOut(timeout),
                    });
                }

                Err(Error::EngineUnavailable {
                    pair,
                    direct: direct_error,
                    fallback: fallback_error,
                })
            }
        }
    }

    /// The multilingual engine is loaded at most once and shared by all pairs.
    async fn multilingual_engine(&self) -> std::result::Result<Arc<dyn TranslationEngine>, LoadError> {
        self.multilingual
            .get_or_try_init(|| {
                self.load_with_timeout(
                    "multilingual engine".to_string(),
                    self.loader.load_multilingual(),
                )
            })
            .await
            .cloned()
    }

    async fn load_with_timeout<F>(
        &self,
        what: String,
        load: F,
    ) -> std::result::Result<Arc<dyn TranslationEngine>, LoadError>
    where
        F: Future<Output = std::result::Result<Arc<dyn TranslationEngine>, LoadError>>,
    {
        match tokio::time::timeout(self.options.load_timeout, load).await {
            Ok(result) => result,
            Err(_) => Err(LoadError::TimedOut {
                model: what,
                timeout: self.options.load_timeout,
            }),
        }
    }

    fn binding(
        &self,
        pair: LanguagePair,
        strategy: Strategy,
        engine: Arc<dyn TranslationEngine>,
    ) -> Binding {
        Binding {
            pair,
            strategy,
            engine: Some(engine),
            timeout: self.options.translate_timeout,
        }
    }
}
