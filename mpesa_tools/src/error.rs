use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpesaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The M-PESA API did not respond in time: {0}")]
    Timeout(String),
    #[error("Network error while calling M-PESA: {0}")]
    Network(String),
    #[error("Could not obtain an M-PESA access token: {0}")]
    AuthenticationFailed(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("M-PESA rejected the request. Code {code}: {description}")]
    Rejected { code: String, description: String },
}

impl MpesaApiError {
    /// Transport-level failures may succeed on a later attempt. Everything else is a definite answer from Daraja.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Network(_)) ||
            matches!(self, Self::QueryError { status, .. } if *status >= 500)
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
