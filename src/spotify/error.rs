use reqwest::{Response, StatusCode};
use thiserror::Error;

use crate::types::SpotifyErrorBody;

/// Failure of one Spotify call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the access token is expired or revoked.
    #[error("access token rejected by Spotify")]
    Unauthorized,

    /// Any other non-success status, with Spotify's message when it sent one.
    #[error("Spotify answered {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            ApiError::Decode(_) => None,
        }
    }

    /// Rate limiting and temporary unavailability; worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::TOO_MANY_REQUESTS)
                | Some(StatusCode::BAD_GATEWAY)
                | Some(StatusCode::SERVICE_UNAVAILABLE)
        )
    }

    /// Whether the token itself was refused; retrying cannot help.
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Turns non-success responses into an [`ApiError`], keeping Spotify's own
/// error message when the body carries one.
pub async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<SpotifyErrorBody>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
        Err(_) => body,
    };

    Err(ApiError::Status { status, message })
}
