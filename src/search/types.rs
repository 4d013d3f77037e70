//! Request, response, and error types for the search service.

use crate::vectara::{QueryResult, UploadDisposition, VectaraError};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors emitted by the search service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller supplied a value the service cannot act on.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Vectara call failed.
    #[error("Vectara request failed: {0}")]
    Vectara(#[from] VectaraError),
    /// Uploaded bytes could not be written to the staging directory.
    #[error("Failed to stage {path:?}: {source}")]
    Staging {
        /// Destination that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

/// A question typed into the chat.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Existing session to continue; a new session is started when absent.
    pub session_id: Option<Uuid>,
    /// Question text.
    pub prompt: String,
    /// Language display name or code; the configured default applies when absent.
    pub language: Option<String>,
    /// Model display name or summarizer prompt name; the configured default applies when absent.
    pub model: Option<String>,
}

/// Answer produced for a chat question.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Session the exchange was recorded under.
    pub session_id: Uuid,
    /// Formatted assistant reply.
    pub reply: String,
    /// Language code sent to the summarizer.
    pub language: String,
    /// Summarizer prompt used.
    pub summarizer: String,
    /// Parsed query result.
    pub result: QueryResult,
}

/// Outcome of indexing an uploaded document.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Sanitized file name stored and sent to Vectara.
    pub file_name: String,
    /// How Vectara accepted the document.
    pub disposition: UploadDisposition,
}
