//! HTTP client wrapper for interacting with Vectara.

use crate::config::Config;
use crate::vectara::types::{CorpusTarget, Credentials, VectaraError};
use reqwest::{Client, Method, StatusCode};
use std::time::Duration;

/// Lightweight HTTP client for the Vectara auth, indexing, and query endpoints.
///
/// The client is cheap to share behind an `Arc`; every operation is a single round trip with
/// no retries.
pub struct VectaraClient {
    pub(crate) http: Client,
    pub(crate) credentials: Credentials,
}

impl VectaraClient {
    /// Construct a client for the supplied OAuth2 credentials.
    pub fn new(credentials: Credentials, timeout: Option<Duration>) -> Result<Self, VectaraError> {
        let mut builder = Client::builder().user_agent("simplimedi/0.1");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        tracing::debug!(
            token_url = %credentials.token_url,
            client_id = %credentials.client_id,
            timeout_secs = ?timeout.map(|value| value.as_secs()),
            "Initialized Vectara HTTP client"
        );

        Ok(Self { http, credentials })
    }

    /// Construct a client using the loaded application configuration.
    pub fn from_config(config: &Config) -> Result<Self, VectaraError> {
        Self::new(
            Credentials {
                client_id: config.app_client_id.clone(),
                client_secret: config.app_client_secret.clone(),
                token_url: config.auth_url.clone(),
            },
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }

    pub(crate) fn request(
        &self,
        method: Method,
        host: &str,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, VectaraError> {
        let base = normalize_base_url(host).map_err(VectaraError::InvalidUrl)?;
        Ok(self.http.request(method, format_endpoint(&base, path)))
    }

    pub(crate) async fn unexpected_status(
        response: reqwest::Response,
        operation: &'static str,
    ) -> VectaraError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            operation,
            code = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("unknown"),
            text = %body,
            "Vectara request failed"
        );
        VectaraError::UnexpectedStatus { status, body }
    }

    pub(crate) fn is_success(status: StatusCode) -> bool {
        status == StatusCode::OK
    }
}

impl CorpusTarget {
    /// Build the configured default target for the indexing endpoint.
    pub fn indexing(config: &Config) -> Self {
        Self {
            customer_id: config.customer_id,
            corpus_id: config.corpus_id,
            host: config.idx_address.clone(),
        }
    }

    /// Build the configured default target for the query endpoint.
    pub fn querying(config: &Config) -> Self {
        Self {
            customer_id: config.customer_id,
            corpus_id: config.corpus_id,
            host: config.query_address.clone(),
        }
    }
}

/// Normalize a service address into a base URL, defaulting to `https` when no scheme is given.
pub(crate) fn normalize_base_url(address: &str) -> Result<String, String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err("service address is empty".to_string());
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    let mut parsed = reqwest::Url::parse(&candidate).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

pub(crate) fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
pub(crate) fn test_client(token_url: &str) -> VectaraClient {
    VectaraClient {
        http: Client::builder()
            .user_agent("simplimedi-test")
            .build()
            .expect("client"),
        credentials: Credentials {
            client_id: "app-client".into(),
            client_secret: "app-secret".into(),
            token_url: token_url.to_string(),
        },
    }
}
