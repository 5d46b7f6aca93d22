#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid entry id: {0}")]
    InvalidId(String),

    #[error("Unexpected mutation payload: {0}")]
    UnexpectedPayload(String),
}
