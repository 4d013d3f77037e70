//! HTTP surface for SimpliMedi-Search.
//!
//! This module exposes a compact Axum router backing the chat and upload screens:
//!
//! - `POST /chat` – Ask a question about the indexed records. Accepts optional `session_id`,
//!   `language`, and `model`; returns the formatted reply, passages, documents, and the
//!   factual consistency score.
//! - `GET /chat/:session_id` – Return the transcript of a chat session.
//! - `POST /upload` – Multipart upload (`file` field) of a PDF, DOCX, or TXT record, indexed
//!   into the configured corpus.
//! - `GET /languages` and `GET /models` – Selectable response languages and summarizers.
//! - `GET /metrics` – Upload/query counters.
//! - `GET /commands` – Machine-readable command catalog.

use crate::catalog::{LANGUAGES, Language, MODELS, SummarizerModel};
use crate::chat::ChatMessage;
use crate::search::{ChatRequest, SearchApi, ServiceError};
use crate::vectara::{Passage, ResponseDocument, UploadDisposition, VectaraError};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Build the HTTP router exposing the chat and upload API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: SearchApi + 'static,
{
    Router::new()
        .route("/chat", post(chat::<S>))
        .route("/chat/:session_id", get(chat_history::<S>))
        .route(
            "/upload",
            post(upload_document::<S>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/languages", get(list_languages))
        .route("/models", get(list_models))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /chat` endpoint.
#[derive(Deserialize)]
struct ChatBody {
    /// Question text.
    prompt: String,
    /// Optional session to continue.
    #[serde(default)]
    session_id: Option<Uuid>,
    /// Optional language display name or ISO 639-3 code.
    #[serde(default)]
    language: Option<String>,
    /// Optional model display name or summarizer prompt name.
    #[serde(default)]
    model: Option<String>,
}

/// Success response for the `POST /chat` endpoint.
#[derive(Serialize)]
struct ChatResponse {
    session_id: Uuid,
    reply: String,
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    factual_consistency: Option<f32>,
    language: String,
    model: String,
    passages: Vec<Passage>,
    documents: Vec<ResponseDocument>,
}

/// Answer a chat question against the configured corpus.
async fn chat<S>(
    State(service): State<Arc<S>>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: SearchApi,
{
    let ChatBody {
        prompt,
        session_id,
        language,
        model,
    } = body;
    let turn = service
        .chat(ChatRequest {
            session_id,
            prompt,
            language,
            model,
        })
        .await?;

    Ok(Json(ChatResponse {
        session_id: turn.session_id,
        reply: turn.reply,
        summary: turn.result.summary,
        factual_consistency: turn.result.factual_consistency,
        language: turn.language,
        model: turn.summarizer,
        passages: turn.result.passages,
        documents: turn.result.documents,
    }))
}

/// Response body for `GET /chat/:session_id`.
#[derive(Serialize)]
struct HistoryResponse {
    session_id: Uuid,
    messages: Vec<ChatMessage>,
}

/// Return the transcript recorded for a session.
async fn chat_history<S>(
    State(service): State<Arc<S>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, AppError>
where
    S: SearchApi,
{
    let messages = service
        .history(session_id)
        .await
        .ok_or(AppError::NotFound("unknown chat session"))?;
    Ok(Json(HistoryResponse {
        session_id,
        messages,
    }))
}

/// Success response for `POST /upload`.
#[derive(Serialize)]
struct UploadResponse {
    file_name: String,
    status: UploadDisposition,
    message: &'static str,
}

/// Stage and index a document received as multipart form data.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: SearchApi,
{
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("failed to read multipart field: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::BadRequest("file part is missing a file name".into()))?;
        let contents = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read file: {err}")))?;

        tracing::info!(file = %file_name, bytes = contents.len(), "Upload received");
        let report = service
            .upload_document(&file_name, contents.to_vec())
            .await?;
        return Ok(Json(UploadResponse {
            file_name: report.file_name,
            status: report.disposition,
            message: "File Uploaded Successfully",
        }));
    }

    Err(AppError::BadRequest("multipart body has no 'file' field".into()))
}

/// Response body for `GET /languages`.
#[derive(Serialize)]
struct LanguagesResponse {
    languages: &'static [Language],
}

/// Enumerate selectable response languages; the first entry is the default.
async fn list_languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: LANGUAGES,
    })
}

/// Response body for `GET /models`.
#[derive(Serialize)]
struct ModelsResponse {
    models: &'static [SummarizerModel],
}

/// Enumerate selectable summarizer models; the first entry is the default.
async fn list_models() -> Json<ModelsResponse> {
    Json(ModelsResponse { models: MODELS })
}

/// Return upload/query counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: SearchApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "chat",
                method: "POST",
                path: "/chat",
                description: "Ask about the uploaded records; returns a summary and its score.",
                request_example: Some(json!({
                    "prompt": "Does the patient have any known allergies?",
                    "session_id": "optional-uuid",
                    "language": "English",
                    "model": "GPT-3.5-Turbo"
                })),
            },
            CommandDescriptor {
                name: "chat_history",
                method: "GET",
                path: "/chat/:session_id",
                description: "Return the messages exchanged in a chat session.",
                request_example: None,
            },
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/upload",
                description: "Upload a PDF, DOCX, or TXT record as multipart field 'file'.",
                request_example: None,
            },
            CommandDescriptor {
                name: "languages",
                method: "GET",
                path: "/languages",
                description: "List response languages accepted by /chat.",
                request_example: None,
            },
            CommandDescriptor {
                name: "models",
                method: "GET",
                path: "/models",
                description: "List summarizer models accepted by /chat.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload and query counters.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Service(ServiceError),
    BadRequest(String),
    NotFound(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.to_string()),
            Self::Service(error) => (service_status(&error), error.to_string()),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn service_status(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Staging { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Vectara(VectaraError::MissingCredentials) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Vectara(VectaraError::Io { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Vectara(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}
