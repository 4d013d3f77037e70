//! Shared types used by the Vectara client and helpers.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while interacting with Vectara.
///
/// Transport failures, application-level rejections, and missing credentials are kept in
/// separate variants so callers can tell them apart.
#[derive(Debug, Error)]
pub enum VectaraError {
    /// Service address failed to parse or normalize.
    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Vectara responded with a non-200 status code.
    #[error("Unexpected Vectara response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Vectara.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Upload returned 200 but the embedded status reported an error.
    #[error("Upload rejected with status {status}")]
    UploadRejected {
        /// Embedded status object as returned by the service.
        status: StatusEntry,
    },
    /// Query returned 200 but at least one embedded status was not `OK`.
    #[error("Query rejected with status {}", format_statuses(.statuses))]
    QueryRejected {
        /// Raw status list as returned by the service.
        statuses: Vec<StatusEntry>,
    },
    /// Corpus creation returned 200 but the embedded status reported an error.
    #[error("Corpus creation rejected with status {status}")]
    CorpusRejected {
        /// Embedded status object as returned by the service.
        status: StatusEntry,
    },
    /// No usable token or API key was available for an authenticated call.
    #[error("Missing credentials: no access token or API key available")]
    MissingCredentials,
    /// A local file could not be read.
    #[error("Failed to read {path:?}: {source}")]
    Io {
        /// Path that failed to open or read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// A 200 response did not have the expected shape.
    #[error("Malformed Vectara response: {0}")]
    MalformedResponse(String),
}

impl VectaraError {
    /// Whether the failure came from missing credentials rather than the service.
    pub fn is_missing_credentials(&self) -> bool {
        matches!(self, Self::MissingCredentials)
    }

    /// Whether the service answered 200 but rejected the request in its embedded status.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::UploadRejected { .. } | Self::QueryRejected { .. } | Self::CorpusRejected { .. }
        )
    }
}

fn format_statuses(statuses: &[StatusEntry]) -> String {
    statuses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Status object embedded in Vectara response bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Machine-readable status code such as `OK` or `ALREADY_EXISTS`.
    #[serde(default)]
    pub code: String,
    /// Optional human-readable detail.
    #[serde(default, rename = "statusDetail", skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
}

impl StatusEntry {
    /// Status code reported for a successful operation.
    pub const OK: &'static str = "OK";
    /// Status code reported when the document was indexed previously.
    pub const ALREADY_EXISTS: &'static str = "ALREADY_EXISTS";

    /// Whether the entry reports `OK`.
    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status_detail {
            Some(detail) if !detail.is_empty() => write!(f, "{} ({detail})", self.code),
            _ => f.write_str(&self.code),
        }
    }
}

/// OAuth2 client-credentials used to obtain bearer tokens.
#[derive(Clone)]
pub struct Credentials {
    /// Application client id.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
    /// Authorization server URL (base or full token endpoint).
    pub token_url: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Bearer token issued by the authorization server.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw bearer string.
    pub value: String,
    /// Lifetime in seconds when the server reports one.
    pub expires_in: Option<u64>,
}

impl AccessToken {
    /// Borrow the bearer string.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Authentication attached to upload, query, and corpus calls.
#[derive(Clone)]
pub enum Credential {
    /// `Authorization: Bearer <token>` from the client-credentials flow.
    Bearer(String),
    /// `x-api-key: <key>` personal API key.
    ApiKey(String),
}

impl Credential {
    pub(crate) fn apply(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, VectaraError> {
        match self {
            Self::Bearer(token) if !token.trim().is_empty() => {
                Ok(request.bearer_auth(token.trim()))
            }
            Self::ApiKey(key) if !key.trim().is_empty() => {
                Ok(request.header("x-api-key", key.trim()))
            }
            _ => Err(VectaraError::MissingCredentials),
        }
    }
}

impl From<AccessToken> for Credential {
    fn from(token: AccessToken) -> Self {
        Self::Bearer(token.value)
    }
}

impl From<&AccessToken> for Credential {
    fn from(token: &AccessToken) -> Self {
        Self::Bearer(token.value.clone())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Credential::Bearer(<redacted>)"),
            Self::ApiKey(_) => f.write_str("Credential::ApiKey(<redacted>)"),
        }
    }
}

/// Customer/corpus pair plus the address of the service hosting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusTarget {
    /// Tenant identifier.
    pub customer_id: u64,
    /// Corpus identifier within the tenant.
    pub corpus_id: u32,
    /// Host (optionally with scheme) of the Vectara endpoint.
    pub host: String,
}

/// A single file to index.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Destination corpus.
    pub target: CorpusTarget,
    /// Local path of the document.
    pub path: PathBuf,
    /// File name reported to the service.
    pub file_name: String,
    /// MIME type of the multipart file part.
    pub mime_type: String,
}

/// How the service accepted an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadDisposition {
    /// Document was indexed by this request.
    Indexed,
    /// Document was already present in the corpus.
    AlreadyExists,
}

/// Successful upload result.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    /// File name sent to the service.
    pub file_name: String,
    /// Normalized status.
    pub disposition: UploadDisposition,
    /// The `response` object returned by the service.
    pub response: Value,
}

/// Per-file entry in a directory batch upload.
#[derive(Debug)]
pub struct FileUpload {
    /// File that was uploaded.
    pub path: PathBuf,
    /// Outcome for this file.
    pub result: Result<UploadReceipt, VectaraError>,
}

impl FileUpload {
    /// Whether the file was accepted by the service.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Query plus summarization parameters.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    /// Corpus to search.
    pub target: CorpusTarget,
    /// Natural-language question.
    pub query: String,
    /// Number of passages to return.
    pub num_results: usize,
    /// ISO 639-3 response language, or `auto`.
    pub language: String,
    /// Summarizer prompt name selecting the generating model.
    pub summarizer: String,
    /// Number of passages the summarizer reads.
    pub max_summarized_results: usize,
    /// Lexical interpolation weight.
    pub lambda: f32,
    /// Request a factual consistency score for the summary.
    pub factual_consistency: bool,
}

/// Ranked passage returned by a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Passage {
    /// Passage text.
    pub text: String,
    /// Relevance score assigned by the service.
    pub score: f32,
    /// Index into [`QueryResult::documents`] when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_index: Option<usize>,
}

/// Name/value metadata pair attached to a matched document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata key.
    pub name: String,
    /// Metadata value.
    #[serde(default)]
    pub value: String,
}

/// Source document referenced by the passages of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseDocument {
    /// Document identifier assigned at upload.
    pub id: String,
    /// Metadata recorded for the document.
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

/// Parsed result of a successful query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Ranked passages in service order.
    pub passages: Vec<Passage>,
    /// Generated summary text.
    pub summary: String,
    /// Factual consistency score for the summary, when computed.
    pub factual_consistency: Option<f32>,
    /// Documents referenced by the passages.
    pub documents: Vec<ResponseDocument>,
}

/// Parameters for creating a corpus.
#[derive(Debug, Clone)]
pub struct CorpusDefinition {
    /// Corpus display name.
    pub name: String,
    /// Optional description.
    pub description: String,
}

/// Result of a successful corpus creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedCorpus {
    /// Identifier assigned to the new corpus.
    pub corpus_id: u32,
    /// Status detail reported by the service.
    pub status_detail: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub(crate) access_token: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: Option<u64>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default, rename = "responseSet")]
    pub(crate) response_set: Vec<ResponseSet>,
}

#[derive(Deserialize)]
pub(crate) struct ResponseSet {
    #[serde(default)]
    pub(crate) response: Vec<RawPassage>,
    #[serde(default)]
    pub(crate) document: Vec<ResponseDocument>,
    #[serde(default)]
    pub(crate) summary: Vec<RawSummary>,
}

#[derive(Deserialize)]
pub(crate) struct RawPassage {
    pub(crate) text: String,
    pub(crate) score: f32,
    #[serde(default, rename = "documentIndex")]
    pub(crate) document_index: Option<usize>,
}

#[derive(Deserialize)]
pub(crate) struct RawSummary {
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default, rename = "factualConsistency")]
    pub(crate) factual_consistency: Option<FactualConsistency>,
}

#[derive(Deserialize)]
pub(crate) struct FactualConsistency {
    pub(crate) score: f32,
}

#[derive(Deserialize)]
pub(crate) struct CreateCorpusResponse {
    #[serde(rename = "corpusId")]
    pub(crate) corpus_id: u32,
    #[serde(default)]
    pub(crate) status: Option<StatusEntry>,
}
