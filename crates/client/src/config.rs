use crate::sync::BatchPolicy;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (default: `http://localhost:8000`).
    pub api_url: String,
    /// Bearer token to start the session with, if any.
    pub api_token: Option<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// What a failed operation does to the rest of a batch.
    pub batch_policy: BatchPolicy,
}

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `BA_API_URL`              | `http://localhost:8000` |
    /// | `BA_API_TOKEN`            | unset                   |
    /// | `BA_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `BA_BATCH_POLICY`         | `independent`           |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("BA_API_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "http://localhost:8000".into());

        let api_token = lookup("BA_API_TOKEN").filter(|t| !t.trim().is_empty());

        let request_timeout_secs = match lookup("BA_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError {
                var: "BA_REQUEST_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: raw.clone(),
            })?,
            None => 30,
        };

        let batch_policy = match lookup("BA_BATCH_POLICY") {
            Some(raw) => raw.parse().map_err(|_| ConfigError {
                var: "BA_BATCH_POLICY",
                expected: "'independent' or 'stop_on_first_error'",
                value: raw.clone(),
            })?,
            None => BatchPolicy::default(),
        };

        Ok(Self {
            api_url,
            api_token,
            request_timeout_secs,
            batch_policy,
        })
    }

    /// Full URL of the GraphQL endpoint.
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.api_url)
    }
}
