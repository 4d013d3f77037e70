//! Query and summarization requests against the Vectara query endpoint.

use crate::vectara::client::VectaraClient;
use crate::vectara::types::{
    CorpusTarget, Credential, Passage, QueryRequest, QueryResponse, QueryResult, StatusEntry,
    VectaraError,
};
use reqwest::Method;
use serde_json::{Value, json};

/// Number of passages requested when the caller does not override it.
pub const DEFAULT_NUM_RESULTS: usize = 10;
/// Number of passages fed to the summarizer by default.
pub const DEFAULT_MAX_SUMMARIZED_RESULTS: usize = 5;
/// Default lexical interpolation weight.
pub const DEFAULT_LAMBDA: f32 = 0.025;
/// Default response language.
pub const DEFAULT_LANGUAGE: &str = "eng";
/// Default summarizer prompt (GPT-3.5-Turbo backed).
pub const DEFAULT_SUMMARIZER: &str = "vectara-summary-ext-v1.2.0";

impl QueryRequest {
    /// Build a request with the standard result counts, language, and summarizer.
    pub fn new(target: CorpusTarget, query: impl Into<String>) -> Self {
        Self {
            target,
            query: query.into(),
            num_results: DEFAULT_NUM_RESULTS,
            language: DEFAULT_LANGUAGE.to_string(),
            summarizer: DEFAULT_SUMMARIZER.to_string(),
            max_summarized_results: DEFAULT_MAX_SUMMARIZED_RESULTS,
            lambda: DEFAULT_LAMBDA,
            factual_consistency: true,
        }
    }

    /// Override the response language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Override the summarizer prompt.
    pub fn with_summarizer(mut self, summarizer: impl Into<String>) -> Self {
        self.summarizer = summarizer.into();
        self
    }

    /// Render the JSON body posted to `/v1/query`.
    pub fn to_body(&self) -> Value {
        json!({
            "query": [
                {
                    "query": self.query,
                    "num_results": self.num_results,
                    "corpus_key": [
                        {
                            "customer_id": self.target.customer_id,
                            "corpus_id": self.target.corpus_id,
                            "lexicalInterpolationConfig": { "lambda": self.lambda },
                        }
                    ],
                    "summary": [
                        {
                            "summarizerPromptName": self.summarizer,
                            "responseLang": self.language,
                            "maxSummarizedResults": self.max_summarized_results,
                            "factual_consistency_score": self.factual_consistency,
                        }
                    ],
                }
            ]
        })
    }
}

impl VectaraClient {
    /// Run a query with an embedded summarization request.
    ///
    /// Fails with [`VectaraError::QueryRejected`] carrying the raw status list when any
    /// top-level status is not `OK`; no partial results are returned in that case.
    pub async fn query_corpus(
        &self,
        credential: &Credential,
        request: &QueryRequest,
    ) -> Result<QueryResult, VectaraError> {
        let builder = self
            .request(Method::POST, &request.target.host, "v1/query")?
            .header("customer-id", request.target.customer_id.to_string());
        let response = credential
            .apply(builder)?
            .json(&request.to_body())
            .send()
            .await?;

        if !Self::is_success(response.status()) {
            return Err(Self::unexpected_status(response, "query").await);
        }

        let payload: Value = response.json().await?;
        let result = parse_query_response(payload)?;
        tracing::info!(
            corpus_id = request.target.corpus_id,
            passages = result.passages.len(),
            documents = result.documents.len(),
            factual_consistency = ?result.factual_consistency,
            "Query answered"
        );
        Ok(result)
    }
}

/// Interpret a 200 query response body.
pub(crate) fn parse_query_response(payload: Value) -> Result<QueryResult, VectaraError> {
    let statuses: Vec<StatusEntry> = match payload.get("status") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| VectaraError::MalformedResponse(format!("status: {err}")))?,
    };
    if statuses.iter().any(|status| !status.is_ok()) {
        tracing::error!(
            statuses = ?statuses,
            "Query rejected by Vectara"
        );
        return Err(VectaraError::QueryRejected { statuses });
    }

    let parsed: QueryResponse = serde_json::from_value(payload)
        .map_err(|err| VectaraError::MalformedResponse(err.to_string()))?;
    let set = parsed
        .response_set
        .into_iter()
        .next()
        .ok_or_else(|| VectaraError::MalformedResponse("responseSet is empty".into()))?;
    let summary = set
        .summary
        .into_iter()
        .next()
        .ok_or_else(|| VectaraError::MalformedResponse("summary is empty".into()))?;

    Ok(QueryResult {
        passages: set
            .response
            .into_iter()
            .map(|raw| Passage {
                text: raw.text,
                score: raw.score,
                document_index: raw.document_index,
            })
            .collect(),
        summary: summary.text,
        factual_consistency: summary.factual_consistency.map(|fcs| fcs.score),
        documents: set.document,
    })
}
