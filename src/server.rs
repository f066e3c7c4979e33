//! HTTP API over the translation service.
//!
//! - `GET /health`
//! - `GET /languages`
//! - `POST /translate` (JSON `TranslationRequest` → `TranslationResponse`)
//! - `POST /speech` (JSON `{text, language}` → `audio/mpeg`)
//!
//! When an API key is configured, `/translate` and `/speech` require it in the
//! `X-API-Key` header.

use crate::error::Error;
use crate::i18n::{Language, LanguageRegistry, AUTO_DETECT_NAME};
use crate::security::is_authorized;
use crate::service::{TranslationRequest, TranslationResponse, TranslationService};
use crate::speech::SpeechError;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranslationService>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// The same request may succeed if retried
    pub retryable: bool,
    /// Input problem to fix rather than a failure
    pub warning: bool,
}

#[derive(Debug, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    /// Display name of the language to speak
    pub language: String,
}

#[derive(Debug, Serialize)]
struct LanguageEntry {
    name: &'static str,
    code: &'static str,
    flag_code: &'static str,
    flag_url: String,
}

#[derive(Debug, Serialize)]
struct LanguagesResponse {
    sources: Vec<&'static str>,
    targets: Vec<LanguageEntry>,
}

/// Error converted to a status code and a user-visible message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                retryable: false,
                warning: false,
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::EmptyText
            | Error::InvalidTemperature(_)
            | Error::UnknownLanguage(_)
            | Error::AutoDetectTarget => StatusCode::BAD_REQUEST,
            Error::EngineUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::TranslationFailed { .. } => StatusCode::BAD_GATEWAY,
        };

        Self {
            status,
            body: ErrorResponse {
                error: err.user_message(),
                retryable: err.is_retryable(),
                warning: err.is_user_warning(),
            },
        }
    }
}

impl From<SpeechError> for ApiError {
    fn from(err: SpeechError) -> Self {
        let status = match &err {
            SpeechError::EmptyText => StatusCode::BAD_REQUEST,
            SpeechError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            SpeechError::Http { .. } | SpeechError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, format!("TTS failed: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/translate", post(translate))
        .route("/speech", post(speech))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if is_authorized(provided, state.api_key.as_deref()) {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid or missing API key."))
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let cached = state.service.selector().cached_pairs().await.len();
    Json(serde_json::json!({
        "status": "ok",
        "cached_bindings": cached,
    }))
}

async fn languages() -> impl IntoResponse {
    let registry = LanguageRegistry::get();
    let all = registry.list_all();

    let sources = std::iter::once(AUTO_DETECT_NAME)
        .chain(all.iter().map(|lang| lang.name))
        .collect();
    let targets = all
        .iter()
        .map(|lang| LanguageEntry {
            name: lang.name,
            code: lang.code,
            flag_code: lang.flag_code,
            flag_url: lang.flag_url(),
        })
        .collect();

    Json(LanguagesResponse { sources, targets })
}

async fn translate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TranslationRequest>,
) -> Result<Json<TranslationResponse>, ApiError> {
    authorize(&state, &headers)?;

    match state.service.translate(&request).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            warn!(
                "Translation request {} -> {} rejected: {}",
                request.source, request.target, e
            );
            Err(e.into())
        }
    }
}

async fn speech(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    authorize(&state, &headers)?;

    let language = Language::from_name(&request.language)?;
    let audio = state.service.speak(&request.text, language.code()).await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
