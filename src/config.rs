use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_CORPUS_ID: u32 = 6;
const DEFAULT_UPLOAD_DIR: &str = "corpus";
const DEFAULT_NUM_RESULTS: usize = 10;
const DEFAULT_MAX_SUMMARIZED_RESULTS: usize = 5;
const DEFAULT_LAMBDA: f32 = 0.025;
const DEFAULT_LANGUAGE: &str = "eng";
const DEFAULT_SUMMARIZER: &str = "vectara-summary-ext-v1.2.0";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for SimpliMedi-Search.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Vectara customer (tenant) identifier.
    pub customer_id: u64,
    /// Personal API key used for corpus administration and API-key authenticated calls.
    pub api_key: String,
    /// OAuth2 authorization server base URL or full token endpoint.
    pub auth_url: String,
    /// OAuth2 application client id.
    pub app_client_id: String,
    /// OAuth2 application client secret.
    pub app_client_secret: String,
    /// Host (optionally with scheme) of the indexing service.
    pub idx_address: String,
    /// Host of the query service; defaults to `idx_address`.
    pub query_address: String,
    /// Corpus that receives uploads and answers queries.
    pub corpus_id: u32,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Directory where uploaded documents are staged before indexing.
    pub upload_dir: PathBuf,
    /// Optional per-request timeout; the HTTP client default applies when unset.
    pub request_timeout_secs: Option<u64>,
    /// Number of passages requested per query.
    pub query_num_results: usize,
    /// Number of passages the summarizer may read.
    pub query_max_summarized_results: usize,
    /// Lexical interpolation weight blended into ranking.
    pub query_lambda: f32,
    /// Response language used when a chat request does not name one.
    pub default_language: String,
    /// Summarizer prompt used when a chat request does not name one.
    pub default_summarizer: String,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let idx_address = required("IDX_ADDRESS")?;
        Ok(Self {
            customer_id: parse_value("CUSTOMER_ID", &required("CUSTOMER_ID")?)?,
            api_key: required("API_KEY")?,
            auth_url: required("AUTH_URL")?,
            app_client_id: required("APP_CLIENT_ID")?,
            app_client_secret: required("APP_CLIENT_SECRET")?,
            query_address: optional("QUERY_ADDRESS").unwrap_or_else(|| idx_address.clone()),
            idx_address,
            corpus_id: optional("CORPUS_ID")
                .map(|value| parse_value("CORPUS_ID", &value))
                .transpose()?
                .unwrap_or(DEFAULT_CORPUS_ID),
            server_port: optional("SERVER_PORT")
                .map(|value| parse_value("SERVER_PORT", &value))
                .transpose()?,
            upload_dir: optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            request_timeout_secs: optional("REQUEST_TIMEOUT_SECS")
                .map(|value| parse_value("REQUEST_TIMEOUT_SECS", &value))
                .transpose()?,
            query_num_results: optional("QUERY_NUM_RESULTS")
                .map(|value| parse_value("QUERY_NUM_RESULTS", &value))
                .transpose()?
                .unwrap_or(DEFAULT_NUM_RESULTS),
            query_max_summarized_results: optional("QUERY_MAX_SUMMARIZED_RESULTS")
                .map(|value| parse_value("QUERY_MAX_SUMMARIZED_RESULTS", &value))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_SUMMARIZED_RESULTS),
            query_lambda: optional("QUERY_LAMBDA")
                .map(|value| parse_value("QUERY_LAMBDA", &value))
                .transpose()?
                .unwrap_or(DEFAULT_LAMBDA),
            default_language: optional("DEFAULT_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            default_summarizer: optional("DEFAULT_SUMMARIZER")
                .unwrap_or_else(|| DEFAULT_SUMMARIZER.to_string()),
        })
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("customer_id", &self.customer_id)
            .field("api_key", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("app_client_id", &self.app_client_id)
            .field("app_client_secret", &"<redacted>")
            .field("idx_address", &self.idx_address)
            .field("query_address", &self.query_address)
            .field("corpus_id", &self.corpus_id)
            .field("server_port", &self.server_port)
            .field("upload_dir", &self.upload_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("query_num_results", &self.query_num_results)
            .field(
                "query_max_summarized_results",
                &self.query_max_summarized_results,
            )
            .field("query_lambda", &self.query_lambda)
            .field("default_language", &self.default_language)
            .field("default_summarizer", &self.default_summarizer)
            .finish()
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        customer_id = config.customer_id,
        corpus_id = config.corpus_id,
        idx_address = %config.idx_address,
        query_address = %config.query_address,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
