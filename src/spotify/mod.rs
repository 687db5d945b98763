//! # Spotify Integration Module
//!
//! Thin client for the parts of the Spotify Web API a library transfer needs.
//! Every pipeline run builds its own [`SpotifyClient`] around a single bearer
//! token; nothing here is global or shared between accounts.
//!
//! ## Layout
//!
//! ```text
//! transfer (collect / replicate)
//!          ↓
//!     LibraryApi trait
//!          ↓
//! SpotifyClient
//!     ├── library   saved tracks and albums
//!     ├── playlist  listing, track listing, create, add tracks
//!     ├── artists   followed artists, follow
//!     └── user      current profile
//!          ↓
//! Spotify Web API (reqwest, JSON)
//! ```
//!
//! [`auth`] is separate: it talks to the accounts service (authorize URL,
//! code exchange, refresh) and has no bearer token of its own.
//!
//! ## Errors
//!
//! All calls return [`ApiError`]. Transient conditions (429, 502, 503) are
//! reported, not retried, here; retrying is the caller's policy (see
//! [`crate::transfer::retry`]).

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::types::{
    AlbumId, AlbumSummary, ArtistId, CreatedPlaylist, CursorPage, NewPlaylist, Page,
    PlaylistSummary, TrackId, UserProfile,
};

pub mod artists;
pub mod auth;
mod error;
pub mod library;
pub mod playlist;
pub mod user;

pub use error::ApiError;

/// The remote operations the transfer pipeline depends on.
///
/// Listing calls return raw pages: entries without an id (local files,
/// removed tracks) and `null` playlist entries stay in the page as `None`
/// so page sizes match what the API sent.
#[async_trait]
pub trait LibraryApi: Send + Sync {
    async fn saved_tracks(&self, offset: u32, limit: u32)
    -> Result<Page<Option<TrackId>>, ApiError>;

    async fn playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<PlaylistSummary>>, ApiError>;

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError>;

    async fn saved_albums(&self, offset: u32, limit: u32) -> Result<Page<AlbumSummary>, ApiError>;

    async fn album_tracks(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError>;

    async fn followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<CursorPage<ArtistId>, ApiError>;

    async fn current_user(&self) -> Result<UserProfile, ApiError>;

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist, ApiError>;

    async fn add_playlist_tracks(&self, playlist_id: &str, uris: &[String])
    -> Result<(), ApiError>;

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<(), ApiError>;

    async fn save_albums(&self, ids: &[AlbumId]) -> Result<(), ApiError>;

    async fn follow_artists(&self, ids: &[ArtistId]) -> Result<(), ApiError>;
}

/// Web API client bound to one access token.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    token: String,
}

impl SpotifyClient {
    /// Binds `http` to one bearer token.
    ///
    /// # Arguments
    ///
    /// * `http` - Shared reqwest client (connection pool)
    /// * `api_url` - Web API base, e.g. `https://api.spotify.com/v1`; a
    ///   trailing slash is ignored
    /// * `token` - Access token of the account every call acts for
    pub fn new(http: Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;

        error::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn put_ids(&self, path: &str, ids: &[String]) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url(path))
            .bearer_auth(&self.token)
            .json(&crate::types::IdsRequest { ids: ids.to_vec() })
            .send()
            .await?;

        error::check(response).await.map(|_| ())
    }
}

#[async_trait]
impl LibraryApi for SpotifyClient {
    async fn saved_tracks(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        self.get_saved_tracks(offset, limit).await
    }

    async fn playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<PlaylistSummary>>, ApiError> {
        self.get_playlists(offset, limit).await
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        self.get_playlist_tracks(playlist_id, offset, limit).await
    }

    async fn saved_albums(&self, offset: u32, limit: u32) -> Result<Page<AlbumSummary>, ApiError> {
        self.get_saved_albums(offset, limit).await
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        self.get_album_tracks(album_id, offset, limit).await
    }

    async fn followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<CursorPage<ArtistId>, ApiError> {
        self.get_followed_artists(after, limit).await
    }

    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.get_current_user().await
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist, ApiError> {
        self.post_playlist(playlist).await
    }

    async fn add_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ApiError> {
        self.post_playlist_tracks(playlist_id, uris).await
    }

    async fn save_tracks(&self, ids: &[TrackId]) -> Result<(), ApiError> {
        self.put_saved_tracks(ids).await
    }

    async fn save_albums(&self, ids: &[AlbumId]) -> Result<(), ApiError> {
        self.put_saved_albums(ids).await
    }

    async fn follow_artists(&self, ids: &[ArtistId]) -> Result<(), ApiError> {
        self.put_followed_artists(ids).await
    }
}
