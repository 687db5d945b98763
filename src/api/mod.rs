//! # API Module
//!
//! HTTP endpoints the browser app talks to.
//!
//! ## Endpoints
//!
//! ### Accounts
//!
//! - [`auth`] starts the Spotify login for the source or target account.
//! - [`callback`] finishes it and stores the credentials in signed cookies.
//! - [`user`] returns the connected profile, [`logout`] forgets it.
//!
//! ### Transfer
//!
//! - [`fetch_data`] reads the source library into a snapshot.
//! - [`migrate`] replays a snapshot into the target account.
//! - [`create_mega_playlist`] and [`create_liked_songs_playlist`] pool the
//!   source library into one new playlist on the source account.
//!
//! The transfer endpoints stream progress as server-sent events; the fetch
//! and migrate runs also have a `/sync` variant answering with plain JSON.
//!
//! ### Monitoring
//!
//! - [`health`] reports status and version.
//!
//! Every request builds its own [`SpotifyClient`] from the caller's cookies;
//! nothing about an account is kept on the server.

use std::sync::Arc;

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tower_cookies::{Cookies, Key};

use crate::{
    config::Config,
    management::CredentialStore,
    spotify::{ApiError, SpotifyClient},
    transfer::TransferError,
    types::Role,
};

mod auth;
mod health;
mod stream;
mod transfer;

pub use auth::{auth, callback, logout, user};
pub use health::health;
pub use stream::{event_stream, spawn_stream};
pub use transfer::{
    create_liked_songs_playlist, create_mega_playlist, fetch_data, fetch_data_sync, migrate,
    migrate_sync,
};

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cookie_key: Key,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config, cookie_key: Key) -> Self {
        Self {
            config: Arc::new(config),
            cookie_key,
            http: reqwest::Client::new(),
        }
    }

    pub fn credentials<'a>(&'a self, cookies: &'a Cookies) -> CredentialStore<'a> {
        CredentialStore::new(cookies, &self.cookie_key, self.config.cookie_secure)
    }

    pub fn client(&self, token: String) -> SpotifyClient {
        SpotifyClient::new(self.http.clone(), self.config.api_url.clone(), token)
    }

    /// A client for `role` built from the caller's cookies, refreshing the
    /// access token when needed.
    pub async fn client_for(
        &self,
        cookies: &Cookies,
        role: Role,
    ) -> Result<SpotifyClient, TransferError> {
        let token = self
            .credentials(cookies)
            .valid_access_token(role, &self.http, &self.config)
            .await?;
        Ok(self.client(token))
    }
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        let status = match &self {
            TransferError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
            TransferError::MissingSnapshot => StatusCode::BAD_REQUEST,
            TransferError::NothingToTransfer => StatusCode::UNPROCESSABLE_ENTITY,
            TransferError::Api(ApiError::Unauthorized) => StatusCode::UNAUTHORIZED,
            TransferError::Api(ApiError::Decode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            TransferError::Api(_) => StatusCode::BAD_GATEWAY,
        };
        json_error(status, self.to_string())
    }
}

pub(crate) fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// 302 with a `Location` header.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Reads a JSON request body; an empty body means all defaults.
pub(crate) fn parse_body<T>(body: &[u8]) -> Result<T, Response>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)))
}

#[derive(Serialize)]
struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

pub(crate) fn success<T: Serialize>(payload: T) -> Response {
    Json(Success {
        success: true,
        payload,
    })
    .into_response()
}
