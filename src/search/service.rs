//! Search service coordinating tokens, uploads, queries, and chat transcripts.

use crate::{
    catalog::{resolve_language, resolve_model},
    chat::{ChatMessage, ChatRole, ChatStore, format_reply},
    config::Config,
    metrics::{ClientMetrics, MetricsSnapshot},
    search::{
        staging::{sanitize_file_name, save_to_dir},
        types::{ChatRequest, ChatTurn, ServiceError, UploadReport},
    },
    vectara::{
        AccessToken, CorpusTarget, Credential, QueryRequest, TokenCache, UploadRequest,
        VectaraClient, VectaraError,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use uuid::Uuid;

/// Coordinates the Vectara client, token cache, chat transcripts, and metrics.
///
/// Construct the service once near process start and share it through an `Arc`.
pub struct SearchService {
    client: VectaraClient,
    tokens: TokenCache,
    chats: ChatStore,
    metrics: ClientMetrics,
    config: Config,
}

/// Abstraction over the search pipeline used by the HTTP surface.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Answer a chat question and record the exchange in its session.
    async fn chat(&self, request: ChatRequest) -> Result<ChatTurn, ServiceError>;

    /// Return the transcript of a session.
    async fn history(&self, session_id: Uuid) -> Option<Vec<ChatMessage>>;

    /// Stage an uploaded document and index it into the configured corpus.
    async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReport, ServiceError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SearchService {
    /// Build a service from configuration.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let client = VectaraClient::from_config(config)?;
        Ok(Self::with_client(client, config.clone()))
    }

    /// Build a service around an existing client.
    pub fn with_client(client: VectaraClient, config: Config) -> Self {
        tracing::info!(
            customer_id = config.customer_id,
            corpus_id = config.corpus_id,
            upload_dir = %config.upload_dir.display(),
            "Search service initialized"
        );
        Self {
            client,
            tokens: TokenCache::new(),
            chats: ChatStore::new(),
            metrics: ClientMetrics::new(),
            config,
        }
    }

    /// Answer a chat question.
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatTurn, ServiceError> {
        let ChatRequest {
            session_id,
            prompt,
            language,
            model,
        } = request;

        let prompt = prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(ServiceError::InvalidInput("prompt must not be empty".into()));
        }
        let language = match language.as_deref() {
            Some(value) => resolve_language(value)
                .ok_or_else(|| ServiceError::InvalidInput(format!("unknown language '{value}'")))?
                .to_string(),
            None => self.config.default_language.clone(),
        };
        let summarizer = match model.as_deref() {
            Some(value) => resolve_model(value)
                .ok_or_else(|| ServiceError::InvalidInput(format!("unknown model '{value}'")))?
                .to_string(),
            None => self.config.default_summarizer.clone(),
        };
        let session_id = session_id.unwrap_or_else(Uuid::new_v4);

        self.chats
            .append(session_id, [ChatMessage::new(ChatRole::User, prompt.clone())])
            .await;

        let mut query = QueryRequest::new(CorpusTarget::querying(&self.config), prompt)
            .with_language(language.clone())
            .with_summarizer(summarizer.clone());
        query.num_results = self.config.query_num_results;
        query.max_summarized_results = self.config.query_max_summarized_results;
        query.lambda = self.config.query_lambda;

        let outcome = match self.bearer().await {
            Ok(token) => {
                self.client
                    .query_corpus(&Credential::from(token), &query)
                    .await
            }
            Err(error) => Err(error),
        };
        let result = match outcome {
            Ok(result) => result,
            Err(error) => {
                self.metrics.record_query(false);
                self.forget_rejected_token(&error).await;
                tracing::error!(session = %session_id, error = %error, "Chat query failed");
                return Err(error.into());
            }
        };
        self.metrics.record_query(true);

        let reply = format_reply(&result.summary, result.factual_consistency);
        self.chats
            .append(
                session_id,
                [ChatMessage::new(ChatRole::Assistant, reply.clone())],
            )
            .await;
        tracing::info!(
            session = %session_id,
            language = %language,
            summarizer = %summarizer,
            passages = result.passages.len(),
            "Chat query answered"
        );

        Ok(ChatTurn {
            session_id,
            reply,
            language,
            summarizer,
            result,
        })
    }

    /// Return the transcript of a session.
    pub async fn history(&self, session_id: Uuid) -> Option<Vec<ChatMessage>> {
        self.chats.history(session_id).await
    }

    /// Stage an uploaded document and index it into the configured corpus.
    pub async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReport, ServiceError> {
        let file_name = sanitize_file_name(file_name)?;
        let path = save_to_dir(&self.config.upload_dir, &file_name, &contents).await?;
        let request = UploadRequest::from_path(CorpusTarget::indexing(&self.config), path);

        let outcome = match self.bearer().await {
            Ok(token) => {
                self.client
                    .upload_file(&Credential::from(token), &request)
                    .await
            }
            Err(error) => Err(error),
        };
        self.metrics.record_upload(outcome.is_ok());

        match outcome {
            Ok(receipt) => Ok(UploadReport {
                file_name: receipt.file_name,
                disposition: receipt.disposition,
            }),
            Err(error) => {
                self.forget_rejected_token(&error).await;
                tracing::error!(file = %file_name, error = %error, "Document upload failed");
                Err(error.into())
            }
        }
    }

    /// Return the current metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn bearer(&self) -> Result<AccessToken, VectaraError> {
        self.tokens
            .token_with(&self.client, || self.metrics.record_token())
            .await
            .map_err(|error| {
                tracing::error!(error = %error, "Failed to obtain access token");
                VectaraError::MissingCredentials
            })
    }

    async fn forget_rejected_token(&self, error: &VectaraError) {
        if let VectaraError::UnexpectedStatus { status, .. } = error
            && (*status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN)
        {
            self.tokens.invalidate().await;
        }
    }
}

#[async_trait]
impl SearchApi for SearchService {
    async fn chat(&self, request: ChatRequest) -> Result<ChatTurn, ServiceError> {
        SearchService::chat(self, request).await
    }

    async fn history(&self, session_id: Uuid) -> Option<Vec<ChatMessage>> {
        SearchService::history(self, session_id).await
    }

    async fn upload_document(
        &self,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<UploadReport, ServiceError> {
        SearchService::upload_document(self, file_name, contents).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SearchService::metrics_snapshot(self)
    }
}
