use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

pub type TrackId = String;
pub type AlbumId = String;
pub type ArtistId = String;

/// Which side of a transfer a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Source,
    Target,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Target => "target",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Role::Source),
            "target" => Ok(Role::Target),
            other => Err(format!("unknown account role '{}'", other)),
        }
    }
}

/// The operation the browser started the login flow for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowMode {
    FullMigration,
    MegaPlaylist,
    LikedSongsPlaylist,
}

impl FlowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowMode::FullMigration => "full-migration",
            FlowMode::MegaPlaylist => "mega-playlist",
            FlowMode::LikedSongsPlaylist => "liked-songs-playlist",
        }
    }
}

impl fmt::Display for FlowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-migration" => Ok(FlowMode::FullMigration),
            "mega-playlist" => Ok(FlowMode::MegaPlaylist),
            "liked-songs-playlist" => Ok(FlowMode::LikedSongsPlaylist),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// How much of the source library a structured collection reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectMode {
    #[default]
    #[serde(rename = "full", alias = "full-migration", alias = "mega-playlist")]
    Full,
    #[serde(rename = "liked-only", alias = "liked-songs-playlist")]
    LikedOnly,
}

/// What a consolidation run pools into its single playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSource {
    /// Liked songs, every playlist and every saved album.
    Everything,
    /// Liked songs only.
    LikedOnly,
}

impl PoolSource {
    pub fn playlist_title(&self) -> &'static str {
        match self {
            PoolSource::Everything => "🎵 My Complete Library",
            PoolSource::LikedOnly => "❤️ My Liked Songs",
        }
    }

    pub fn describe(&self, total: usize, created: &str) -> String {
        match self {
            PoolSource::Everything => format!(
                "All songs from liked songs, playlists, and albums. Created on {}. Total: {} unique tracks.",
                created, total
            ),
            PoolSource::LikedOnly => format!(
                "All my liked songs exported on {}. Total: {} tracks.",
                created, total
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSnapshot {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub tracks: Vec<TrackId>,
    #[serde(default)]
    pub is_public: bool,
}

/// Everything one collection run read from the source account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibrarySnapshot {
    #[serde(default, deserialize_with = "lenient_ids")]
    pub saved_tracks: Vec<TrackId>,
    #[serde(default)]
    pub playlists: Vec<PlaylistSnapshot>,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub saved_albums: Vec<AlbumId>,
    #[serde(default, deserialize_with = "lenient_ids")]
    pub followed_artists: Vec<ArtistId>,
}

impl LibrarySnapshot {
    pub fn counts(&self) -> LibraryCounts {
        LibraryCounts {
            liked_songs: self.saved_tracks.len(),
            playlists: self.playlists.len(),
            albums: self.saved_albums.len(),
            artists: self.followed_artists.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryCounts {
    pub liked_songs: usize,
    pub playlists: usize,
    pub albums: usize,
    pub artists: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    LikedSongs,
    Playlists,
    Albums,
    Artists,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::LikedSongs => "liked songs",
            Category::Playlists => "playlists",
            Category::Albums => "albums",
            Category::Artists => "artists",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFailure {
    pub category: Category,
    pub message: String,
}

/// Counts of items written to the target account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationResult {
    pub liked_songs: usize,
    pub playlists: usize,
    pub albums: usize,
    pub artists: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<CategoryFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedPlaylist {
    pub playlist_id: String,
    pub playlist_url: String,
    pub total_tracks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub stage: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub expires_in: u64,
    pub obtained_at: u64,
}

impl Token {
    /// Absolute expiry in unix milliseconds.
    pub fn expires_at_millis(&self) -> i64 {
        ((self.obtained_at + self.expires_in) * 1000) as i64
    }
}

// Remote listing shapes handed from the API client to the pipeline.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumSummary {
    pub id: AlbumId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlaylist {
    pub id: String,
    pub url: String,
}

// Spotify Web API wire types.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: Option<u32>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedTrackItem {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackItem {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplePlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAlbumItem {
    pub album: SimpleAlbum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleAlbum {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: ArtistsContainer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistsContainer {
    pub items: Vec<Artist>,
    pub next: Option<String>,
    pub cursors: Option<Cursors>,
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cursors {
    pub after: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistResponse {
    pub id: String,
    pub name: String,
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(rename(serialize = "displayName", deserialize = "display_name"))]
    pub display_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    pub expires_in: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyErrorBody {
    pub error: SpotifyErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyErrorDetail {
    pub message: String,
}

// Snapshots come back from browser storage; `null` ids turn into empty
// strings so the replicator can drop them like any other invalid id.
fn lenient_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids: Vec<Option<String>> = Vec::deserialize(deserializer)?;
    Ok(ids.into_iter().map(Option::unwrap_or_default).collect())
}
