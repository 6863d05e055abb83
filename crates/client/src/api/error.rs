use common::remote::RemoteFailure;
use common::session::TokenStoreError;
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("session token unavailable: {0}")]
    Token(#[from] TokenStoreError),
}

impl From<ApiError> for RemoteFailure {
    /// Classify at the network boundary; only the status code and the
    /// reqwest error kind are consulted
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::HttpStatus(StatusCode::UNAUTHORIZED, _) => RemoteFailure::Unauthorized,
            ApiError::HttpStatus(StatusCode::FORBIDDEN, _) => RemoteFailure::Forbidden,
            ApiError::HttpStatus(status, body) => {
                RemoteFailure::Other(format!("status {}: {}", status.as_u16(), body))
            }
            ApiError::Reqwest(e) if e.is_decode() => RemoteFailure::Other(e.to_string()),
            ApiError::Reqwest(e) => RemoteFailure::Transport(e.to_string()),
            ApiError::UrlParse(e) => RemoteFailure::Transport(e.to_string()),
            ApiError::Token(e) => RemoteFailure::Other(e.to_string()),
        }
    }
}
