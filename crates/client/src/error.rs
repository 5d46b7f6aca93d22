use betterangels_core::error::CoreError;

/// Errors from talking to the BetterAngels API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status other than 401.
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The API answered 401; stored credentials have been cleared.
    #[error("Session expired")]
    SessionExpired,

    /// Top-level GraphQL `errors` in an otherwise successful response.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// The response body was not the JSON we expected.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// A local file for an upload could not be read.
    #[error("Cannot read upload '{name}': {source}")]
    Upload {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience alias for client return values.
pub type ClientResult<T> = Result<T, ClientError>;
