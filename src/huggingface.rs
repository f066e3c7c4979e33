//! Hugging Face backend.
//!
//! Loading an engine checks that the model exists on the Hub; translating posts
//! the text to the Inference API. Direct engines use the pair-specific
//! `{namespace}-{source}-{target}` models. The multilingual engine sends the
//! source and target codes with every request.

use crate::config::Config;
use crate::engine::{EngineLoader, EngineOutput, LanguagePair, TranslationEngine};
use crate::error::{EngineError, LoadError};
use crate::retry::{with_retry_if, Retry, RetryConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceParameters<'a> {
    max_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    src_lang: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tgt_lang: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// Body of the 503 the inference API sends while a model is loading.
#[derive(Debug, Deserialize)]
struct ModelLoading {
    estimated_time: f64,
}

/// Loads engines backed by the Hugging Face Hub and Inference API.
#[derive(Debug, Clone)]
pub struct HubLoader {
    client: reqwest::Client,
    hub_url: String,
    inference_url: String,
    token: Option<String>,
    direct_namespace: String,
    multilingual_model: String,
    max_length: u32,
    lookup_retry: RetryConfig,
    inference_retry: RetryConfig,
}

impl HubLoader {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            hub_url: config.hf_hub_url.trim_end_matches('/').to_string(),
            inference_url: config.hf_inference_url.trim_end_matches('/').to_string(),
            token: config.hf_api_token.clone(),
            direct_namespace: config.direct_model_namespace.clone(),
            multilingual_model: config.multilingual_model.clone(),
            max_length: config.max_length,
            lookup_retry: RetryConfig::model_lookup(),
            inference_retry: RetryConfig::inference(),
        }
    }

    /// Override the retry policies (model lookup, inference).
    pub fn with_retry(mut self, lookup: RetryConfig, inference: RetryConfig) -> Self {
        self.lookup_retry = lookup;
        self.inference_retry = inference;
        self
    }

    /// Model id of the direct engine for a pair, e.g. `Helsinki-NLP/opus-mt-en-hi`.
    pub fn direct_model_id(&self, pair: &LanguagePair) -> String {
        format!("{}-{}-{}", self.direct_namespace, pair.source, pair.target)
    }

    async fn lookup(&self, model_id: &str) -> Result<(), LoadError> {
        let url = format!("{}/api/models/{}", self.hub_url, model_id);

        with_retry_if(
            &self.lookup_retry,
            &format!("Model lookup {}", model_id),
            || async {
                let mut request = self.client.get(&url);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }

                let response = request.send().await.map_err(|e| LoadError::Network {
                    model: model_id.to_string(),
                    reason: e.to_string(),
                })?;

                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    return Err(LoadError::NotFound {
                        model: model_id.to_string(),
                    });
                }
                if !status.is_success() {
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    return Err(LoadError::Http {
                        model: model_id.to_string(),
                        status: status.as_u16(),
                        body: truncate(&body),
                    });
                }

                Ok(())
            },
            |e: &LoadError| Retry::on(e.is_transient()),
        )
        .await
    }

    fn engine(&self, model_id: String, multilingual: bool) -> Arc<dyn TranslationEngine> {
        Arc::new(HubEngine {
            client: self.client.clone(),
            endpoint: format!("{}/models/{}", self.inference_url, model_id),
            token: self.token.clone(),
            model_id,
            multilingual,
            max_length: self.max_length,
            retry: self.inference_retry.clone(),
        })
    }
}

#[async_trait]
impl EngineLoader for HubLoader {
    async fn load_direct(
        &self,
        pair: &LanguagePair,
    ) -> Result<Arc<dyn TranslationEngine>, LoadError> {
        let model_id = self.direct_model_id(pair);
        self.lookup(&model_id).await?;
        debug!("Found direct model {}", model_id);
        Ok(self.engine(model_id, false))
    }

    async fn load_multilingual(&self) -> Result<Arc<dyn TranslationEngine>, LoadError> {
        let model_id = self.multilingual_model.clone();
        self.lookup(&model_id).await?;
        debug!("Found multilingual model {}", model_id);
        Ok(self.engine(model_id, true))
    }
}

/// An engine served by the Inference API.
#[derive(Debug)]
pub struct HubEngine {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    model_id: String,
    multilingual: bool,
    max_length: u32,
    retry: RetryConfig,
}

impl HubEngine {
    fn request<'a>(&self, text: &'a str, pair: &'a LanguagePair) -> InferenceRequest<'a> {
        let (src_lang, tgt_lang) = if self.multilingual {
            (Some(pair.source.as_str()), Some(pair.target.as_str()))
        } else {
            (None, None)
        };

        InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                max_length: self.max_length,
                src_lang,
                tgt_lang,
            },
            options: InferenceOptions {
                wait_for_model: true,
            },
        }
    }
}

#[async_trait]
impl TranslationEngine for HubEngine {
    async fn translate(
        &self,
        text: &str,
        pair: &LanguagePair,
    ) -> Result<EngineOutput, EngineError> {
        let request = self.request(text, pair);

        with_retry_if(
            &self.retry,
            &format!("Translation {} with {}", pair, self.model_id),
            || async {
                let mut builder = self.client.post(&self.endpoint).json(&request);
                if let Some(token) = &self.token {
                    builder = builder.bearer_auth(token);
                }

                let response = builder
                    .send()
                    .await
                    .map_err(|e| EngineError::Network(e.to_string()))?;

                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|e| EngineError::Network(e.to_string()))?;

                if status == StatusCode::SERVICE_UNAVAILABLE {
                    if let Some(wait) = loading_wait(&body) {
                        return Err(EngineError::ModelLoading { wait });
                    }
                }
                if !status.is_success() {
                    return Err(EngineError::Http {
                        status: status.as_u16(),
                        body: truncate(&body),
                    });
                }

                serde_json::from_str::<EngineOutput>(&body)
                    .map_err(|e| EngineError::Decode(format!("{} in '{}'", e, truncate(&body))))
            },
            classify,
        )
        .await
    }

    fn name(&self) -> &str {
        &self.model_id
    }
}

/// Wait the API estimated for a loading model, if the body carries a usable one.
///
/// Values that are not positive or do not fit a `Duration` are ignored.
fn loading_wait(body: &str) -> Option<Duration> {
    let loading = serde_json::from_str::<ModelLoading>(body).ok()?;
    if loading.estimated_time <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(loading.estimated_time).ok()
}

fn classify(err: &EngineError) -> Retry {
    match err {
        EngineError::ModelLoading { wait } => Retry::After(*wait),
        other => Retry::on(other.is_transient()),
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use std::time::Duration;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_test_loader(server_url: &str) -> HubLoader {
        let config = Config {
            hf_inference_url: server_url.to_string(),
            hf_hub_url: server_url.to_string(),
            ..Config::for_tests()
        };
        let fast = RetryConfig::new(3, Duration::from_millis(10));
        HubLoader::new(reqwest::Client::new(), &config).with_retry(fast.clone(), fast)
    }

    fn pair(source: &str, target: &str) -> LanguagePair {
        LanguagePair::new(source, target)
    }

    #[test]
    fn test_direct_model_id() {
        let loader = create_test_loader("http://localhost");
        assert_eq!(
            loader.direct_model_id(&pair("en", "hi")),
            "Helsinki-NLP/opus-mt-en-hi"
        );
    }

    #[test]
    fn test_request_serialization_direct_omits_codes() {
        let loader = create_test_loader("http://localhost");
        let engine = HubEngine {
            client: reqwest::Client::new(),
            endpoint: String::new(),
            token: None,
            model_id: loader.direct_model_id(&pair("en", "fr")),
            multilingual: false,
            max_length: 512,
            retry: RetryConfig::default(),
        };
        let p = pair("en", "fr");

        let json = serde_json::to_value(engine.request("Hello", &p)).unwrap();
        assert_eq!(json["inputs"], "Hello");
        assert_eq!(json["parameters"]["max_length"], 512);
        assert!(json["parameters"].get("src_lang").is_none());
        assert_eq!(json["options"]["wait_for_model"], true);
    }

    #[test]
    fn test_loading_wait_from_estimate() {
        assert_eq!(
            loading_wait(r#"{"error":"Model is currently loading","estimated_time":12.5}"#),
            Some(Duration::from_millis(12_500))
        );
        assert_eq!(loading_wait("Service Unavailable"), None);
        assert_eq!(loading_wait(r#"{"estimated_time":0.0}"#), None);
        assert_eq!(loading_wait(r#"{"estimated_time":-4}"#), None);
    }

    #[test]
    fn test_loading_wait_ignores_oversized_estimate() {
        assert_eq!(loading_wait(r#"{"estimated_time":1e20}"#), None);
        assert_eq!(loading_wait(r#"{"estimated_time":1.7e308}"#), None);
    }

    #[test]
    fn test_loading_wait_reads_long_bodies() {
        let body = serde_json::json!({
            "error": "x".repeat(2 * MAX_ERROR_BODY),
            "estimated_time": 3.0
        })
        .to_string();
        assert!(body.chars().count() > MAX_ERROR_BODY);
        assert_eq!(loading_wait(&body), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_classify() {
        let loading = EngineError::ModelLoading {
            wait: Duration::from_secs(12),
        };
        assert_eq!(classify(&loading), Retry::After(Duration::from_secs(12)));

        let busy = EngineError::Http {
            status: 503,
            body: "Service Unavailable".to_string(),
        };
        assert_eq!(classify(&busy), Retry::Backoff);

        let rejected = EngineError::Http {
            status: 400,
            body: r#"{"estimated_time":3.0}"#.to_string(),
        };
        assert_eq!(classify(&rejected), Retry::Stop);
    }

    #[tokio::test]
    async fn test_oversized_loading_estimate_backs_off() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-fr"))
            .respond_with(ResponseTemplate::new(503).set_body_string(
                r#"{"error":"Model is currently loading","estimated_time":1e20}"#,
            ))
            .expect(3)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "fr");
        let engine = loader.engine(loader.direct_model_id(&p), false);

        match engine.translate("Hello", &p).await {
            Err(EngineError::Http { status, .. }) => assert_eq!(status, 503),
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_long_loading_body_waits_for_estimate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-fr"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": format!("Model is currently loading. {}", "details ".repeat(80)),
                "estimated_time": 0.01
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-fr"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"translation_text": "Bonjour"}])),
            )
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "fr");
        let engine = loader.engine(loader.direct_model_id(&p), false);

        assert_eq!(normalize(engine.translate("Hello", &p).await.unwrap()), "Bonjour");
    }

    #[tokio::test]
    async fn test_load_direct_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/Helsinki-NLP/opus-mt-en-fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "Helsinki-NLP/opus-mt-en-fr",
                "pipeline_tag": "translation"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let engine = loader.load_direct(&pair("en", "fr")).await.unwrap();
        assert_eq!(engine.name(), "Helsinki-NLP/opus-mt-en-fr");
    }

    #[tokio::test]
    async fn test_load_direct_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/Helsinki-NLP/opus-mt-en-ko"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        match loader.load_direct(&pair("en", "ko")).await {
            Err(LoadError::NotFound { model }) => assert_eq!(model, "Helsinki-NLP/opus-mt-en-ko"),
            Err(e) => panic!("Expected NotFound, got {}", e),
            Ok(_) => panic!("Expected NotFound"),
        }
    }

    #[tokio::test]
    async fn test_load_server_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/facebook/m2m100_418M"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(3)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        match loader.load_multilingual().await {
            Err(LoadError::Http { status, body, .. }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            Err(e) => panic!("Expected Http, got {}", e),
            Ok(_) => panic!("Expected Http error"),
        }
    }

    #[tokio::test]
    async fn test_load_sends_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/facebook/m2m100_418M"))
            .and(header("Authorization", "Bearer hf_secret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            hf_hub_url: server.uri(),
            hf_api_token: Some("hf_secret".to_string()),
            ..Config::for_tests()
        };
        let loader = HubLoader::new(reqwest::Client::new(), &config);
        assert!(loader.load_multilingual().await.is_ok());
    }

    #[tokio::test]
    async fn test_direct_translation() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/Helsinki-NLP/opus-mt-en-fr"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-fr"))
            .and(body_partial_json(serde_json::json!({"inputs": "Hello"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"translation_text": "Bonjour"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "fr");
        let engine = loader.load_direct(&p).await.unwrap();
        let output = engine.translate("Hello", &p).await.unwrap();

        assert_eq!(normalize(output), "Bonjour");
    }

    #[tokio::test]
    async fn test_multilingual_translation_sends_codes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models/facebook/m2m100_418M"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/facebook/m2m100_418M"))
            .and(body_partial_json(serde_json::json!({
                "parameters": {"src_lang": "en", "tgt_lang": "ko"}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([{"translation_text": "안녕하세요"}])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let engine = loader.load_multilingual().await.unwrap();
        let output = engine.translate("Hello", &pair("en", "ko")).await.unwrap();

        assert_eq!(normalize(output), "안녕하세요");
    }

    #[tokio::test]
    async fn test_translation_retries_while_model_loads() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-de"))
            .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
                "error": "Model is currently loading"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-de"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"translation_text": "Hallo"})),
            )
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "de");
        let engine = loader.engine(loader.direct_model_id(&p), false);
        let output = engine.translate("Hello", &p).await.unwrap();

        assert_eq!(normalize(output), "Hallo");
    }

    #[tokio::test]
    async fn test_translation_client_error_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-de"))
            .respond_with(ResponseTemplate::new(400).set_body_string("input too long"))
            .expect(1)
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "de");
        let engine = loader.engine(loader.direct_model_id(&p), false);

        match engine.translate("Hello", &p).await {
            Err(EngineError::Http { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("too long"));
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_translation_unexpected_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/Helsinki-NLP/opus-mt-en-de"))
            .respond_with(ResponseTemplate::new(200).set_body_string("12345"))
            .mount(&server)
            .await;

        let loader = create_test_loader(&server.uri());
        let p = pair("en", "de");
        let engine = loader.engine(loader.direct_model_id(&p), false);

        assert!(matches!(
            engine.translate("Hello", &p).await,
            Err(EngineError::Decode(_))
        ));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(MAX_ERROR_BODY + 50);
        let truncated = truncate(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("short"), "short");
    }
}
