//! # Transfer pipeline
//!
//! Reads a library from one account and replays it into another.
//!
//! ```text
//! collect ──► LibrarySnapshot ──(browser storage)──► replicate ──► MigrationResult
//!    │                                                   │
//!    └── paginate + retry                 batches + retry┘
//!               progress records stream out of both ends
//! ```
//!
//! Everything runs sequentially inside one task per request. Spotify's rate
//! limit is shared per application, so pages and batches are never fanned out
//! and a short pause ([`PACE`]) separates consecutive remote calls.

use std::time::Duration;

use thiserror::Error;

use crate::{spotify::ApiError, types::Role};

pub mod collect;
pub mod paginate;
pub mod progress;
pub mod replicate;
pub mod retry;

pub use collect::{TrackPool, collect_library, collect_pool};
pub use paginate::{CursorPaginator, OffsetPaginator};
pub use progress::{COMPLETE_STAGE, ProgressReporter, encode_frame};
pub use replicate::{consolidate, replicate_library};
pub use retry::RetryPolicy;

/// Pause between consecutive pages or write batches.
pub const PACE: Duration = Duration::from_millis(100);

/// Page size for `GET /me/tracks` (API maximum).
pub const SAVED_TRACKS_PAGE: u32 = 50;
/// Page size for `GET /me/playlists` (API maximum).
pub const PLAYLISTS_PAGE: u32 = 50;
/// Page size for `GET /playlists/{id}/tracks` (API maximum).
pub const PLAYLIST_TRACKS_PAGE: u32 = 100;
/// Page size for `GET /me/albums` (API maximum).
pub const SAVED_ALBUMS_PAGE: u32 = 50;
/// Page size for `GET /albums/{id}/tracks` (API maximum).
pub const ALBUM_TRACKS_PAGE: u32 = 50;
/// Page size for the followed-artists cursor listing (API maximum).
pub const FOLLOWED_ARTISTS_PAGE: u32 = 50;

// Per-call write caps of the Web API. They differ per endpoint.

/// Ids per `PUT /me/tracks`.
pub const SAVED_TRACKS_BATCH: usize = 50;
/// URIs per `POST /playlists/{id}/tracks`.
pub const PLAYLIST_TRACKS_BATCH: usize = 100;
/// Ids per `PUT /me/albums`.
pub const SAVED_ALBUMS_BATCH: usize = 20;
/// Ids per `PUT /me/following`.
pub const FOLLOW_ARTISTS_BATCH: usize = 50;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{} account not authenticated", capitalize(.0.as_str()))]
    NotAuthenticated(Role),

    #[error("No migration data found. Please fetch data from source account first.")]
    MissingSnapshot,

    #[error("No tracks found")]
    NothingToTransfer,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl TransferError {
    pub fn is_auth(&self) -> bool {
        match self {
            TransferError::NotAuthenticated(_) => true,
            TransferError::Api(e) => e.is_auth(),
            _ => false,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
