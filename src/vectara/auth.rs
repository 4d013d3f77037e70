//! OAuth2 client-credentials token acquisition.

use crate::vectara::client::VectaraClient;
use crate::vectara::types::{AccessToken, TokenResponse, VectaraError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const TOKEN_PATH: &str = "/oauth2/token";
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

impl VectaraClient {
    /// Exchange the configured client id/secret for a bearer token.
    pub async fn fetch_token(&self) -> Result<AccessToken, VectaraError> {
        let endpoint = token_endpoint(&self.credentials.token_url);
        let response = self
            .http
            .post(&endpoint)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !Self::is_success(response.status()) {
            return Err(Self::unexpected_status(response, "token").await);
        }

        let payload: TokenResponse = response.json().await?;
        let value = payload
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(VectaraError::MissingCredentials)?;

        tracing::debug!(expires_in = ?payload.expires_in, "Obtained access token");
        Ok(AccessToken {
            value,
            expires_in: payload.expires_in,
        })
    }

    /// Fetch a token, logging and discarding any failure.
    pub async fn get_jwt_token(&self) -> Option<AccessToken> {
        match self.fetch_token().await {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::error!(error = %error, "Failed to obtain access token");
                None
            }
        }
    }
}

/// Resolve the token endpoint, appending `/oauth2/token` unless the URL already names it.
pub(crate) fn token_endpoint(auth_url: &str) -> String {
    let trimmed = auth_url.trim().trim_end_matches('/');
    if trimmed.ends_with(TOKEN_PATH) {
        trimmed.to_string()
    } else {
        format!("{trimmed}{TOKEN_PATH}")
    }
}

#[derive(Clone)]
struct CachedToken {
    token: AccessToken,
    expires_at: Instant,
}

/// Reuses a bearer token until shortly before the expiry reported by the server.
///
/// Tokens issued without `expires_in` are never cached, so every call re-acquires one.
#[derive(Default)]
pub struct TokenCache {
    cached: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a valid token, fetching a fresh one when the cached token is missing or stale.
    pub async fn token(&self, client: &VectaraClient) -> Result<AccessToken, VectaraError> {
        self.token_with(client, || {}).await
    }

    /// Like [`TokenCache::token`], invoking `on_fetch` whenever a new token is issued.
    pub async fn token_with<F>(
        &self,
        client: &VectaraClient,
        on_fetch: F,
    ) -> Result<AccessToken, VectaraError>
    where
        F: FnOnce(),
    {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref()
                && entry.expires_at > Instant::now() + REFRESH_MARGIN
            {
                return Ok(entry.token.clone());
            }
        }

        let token = client.fetch_token().await?;
        on_fetch();
        let mut cached = self.cached.write().await;
        *cached = token
            .expires_in
            .and_then(|seconds| Instant::now().checked_add(Duration::from_secs(seconds)))
            .map(|expires_at| CachedToken {
                token: token.clone(),
                expires_at,
            });
        Ok(token)
    }

    /// Drop any cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectara::client::test_client;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    #[tokio::test]
    async fn returns_access_token_on_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/oauth2/token")
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body_contains("grant_type=client_credentials")
                    .body_contains("client_id=app-client")
                    .body_contains("client_secret=app-secret");
                then.status(200).json_body(json!({ "access_token": "abc" }));
            })
            .await;

        let client = test_client(&server.base_url());
        let token = client.fetch_token().await.expect("token");

        mock.assert();
        assert_eq!(token.as_str(), "abc");
        assert_eq!(token.expires_in, None);
    }

    #[tokio::test]
    async fn non_200_yields_no_token() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(401).body("invalid_client");
            })
            .await;

        let client = test_client(&server.base_url());
        assert!(client.get_jwt_token().await.is_none());

        match client.fetch_token().await {
            Err(VectaraError::UnexpectedStatus { status, body }) => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "invalid_client");
            }
            other => panic!("expected unexpected status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_access_token_field_is_missing_credentials() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({ "token_type": "bearer" }));
            })
            .await;

        let client = test_client(&server.base_url());
        let error = client.fetch_token().await.expect_err("no token");
        assert!(error.is_missing_credentials());
    }

    #[test]
    fn token_endpoint_appends_path_once() {
        assert_eq!(
            token_endpoint("https://auth.example.org/"),
            "https://auth.example.org/oauth2/token"
        );
        assert_eq!(
            token_endpoint("https://auth.example.org/oauth2/token"),
            "https://auth.example.org/oauth2/token"
        );
    }

    #[tokio::test]
    async fn cache_reuses_tokens_with_expiry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200)
                    .json_body(json!({ "access_token": "cached", "expires_in": 3600 }));
            })
            .await;

        let client = test_client(&server.base_url());
        let cache = TokenCache::new();
        let first = cache.token(&client).await.expect("first");
        let second = cache.token(&client).await.expect("second");

        assert_eq!(first, second);
        mock.assert_hits(1);

        cache.invalidate().await;
        cache.token(&client).await.expect("third");
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn cache_refetches_tokens_without_expiry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({ "access_token": "fresh" }));
            })
            .await;

        let client = test_client(&server.base_url());
        let cache = TokenCache::new();
        cache.token(&client).await.expect("first");
        cache.token(&client).await.expect("second");
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn cache_skips_tokens_with_unrepresentable_expiry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({
                    "access_token": "forever",
                    "expires_in": u64::MAX
                }));
            })
            .await;

        let client = test_client(&server.base_url());
        let cache = TokenCache::new();
        let token = cache.token(&client).await.expect("first");
        cache.token(&client).await.expect("second");

        assert_eq!(token.as_str(), "forever");
        assert_eq!(token.expires_in, Some(u64::MAX));
        mock.assert_hits(2);
    }
}
