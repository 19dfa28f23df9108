//! Error taxonomy for endpoint requests.

use thiserror::Error;

/// Outcome of a request that did not produce a decoded response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    /// The request was cancelled on purpose.  Never a pipeline failure.
    #[error("request aborted")]
    Aborted,

    /// Transport failure, timeout or non-success HTTP status.
    #[error("request failed: {0}")]
    Failed(String),

    /// The response body could not be decoded into the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl NetworkError {
    pub fn is_abort(&self) -> bool {
        matches!(self, NetworkError::Aborted)
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NetworkError::MalformedResponse(e.to_string())
        } else {
            NetworkError::Failed(e.to_string())
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self {
        NetworkError::MalformedResponse(e.to_string())
    }
}
