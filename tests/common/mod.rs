#![allow(dead_code)]

pub mod web;

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use reqwest::StatusCode;
use spotmover::{
    spotify::{ApiError, LibraryApi},
    types::{
        AlbumSummary, CreatedPlaylist, CursorPage, NewPlaylist, Page, PlaylistSummary,
        UserProfile,
    },
};

/// In-memory Spotify account. Records every call and every write, and can be
/// told to fail selected operations.
#[derive(Default)]
pub struct FakeLibrary {
    pub liked: Vec<Option<String>>,
    pub playlists: Vec<(PlaylistSummary, Vec<Option<String>>)>,
    pub albums: Vec<(AlbumSummary, Vec<Option<String>>)>,
    pub artists: Vec<String>,
    /// Whether listing pages report a `total`.
    pub report_total: bool,
    failures: Mutex<HashMap<&'static str, VecDeque<StatusCode>>>,
    pub log: Mutex<Vec<String>>,
    pub saved_batches: Mutex<Vec<Vec<String>>>,
    pub created: Mutex<Vec<NewPlaylist>>,
    pub added: Mutex<Vec<(String, Vec<String>)>>,
    pub album_batches: Mutex<Vec<Vec<String>>>,
    pub artist_batches: Mutex<Vec<Vec<String>>>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_liked(mut self, ids: &[&str]) -> Self {
        self.liked = ids.iter().map(|id| some_id(id)).collect();
        self
    }

    pub fn with_playlist(mut self, name: &str, ids: &[&str]) -> Self {
        let id = format!("pl{}", self.playlists.len() + 1);
        self.playlists.push((
            PlaylistSummary {
                id,
                name: name.to_string(),
                description: None,
                public: None,
            },
            ids.iter().map(|id| some_id(id)).collect(),
        ));
        self
    }

    pub fn with_album(mut self, name: &str, ids: &[&str]) -> Self {
        let id = format!("al{}", self.albums.len() + 1);
        self.albums.push((
            AlbumSummary {
                id,
                name: name.to_string(),
            },
            ids.iter().map(|id| some_id(id)).collect(),
        ));
        self
    }

    pub fn with_artists(mut self, ids: &[&str]) -> Self {
        self.artists = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn reporting_totals(mut self) -> Self {
        self.report_total = true;
        self
    }

    /// Makes the next `times` calls of `op` fail with `status`.
    pub fn fail(&self, op: &'static str, status: StatusCode, times: usize) {
        let mut failures = self.failures.lock().unwrap();
        let queue = failures.entry(op).or_default();
        for _ in 0..times {
            queue.push_back(status);
        }
    }

    pub fn calls(&self, op: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.split(':').next() == Some(op))
            .count()
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn batch_sizes(batches: &Mutex<Vec<Vec<String>>>) -> Vec<usize> {
        batches.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn record(&self, op: &'static str, detail: String) -> Result<(), ApiError> {
        self.log.lock().unwrap().push(format!("{}:{}", op, detail));
        let next = self
            .failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(VecDeque::pop_front);
        match next {
            None => Ok(()),
            Some(StatusCode::UNAUTHORIZED) => Err(ApiError::Unauthorized),
            Some(status) => Err(ApiError::Status {
                status,
                message: format!("scripted {}", status.as_u16()),
            }),
        }
    }

    fn page<T: Clone>(&self, items: &[T], offset: u32, limit: u32) -> Page<T> {
        let start = (offset as usize).min(items.len());
        let end = (start + limit as usize).min(items.len());
        Page {
            items: items[start..end].to_vec(),
            total: self.report_total.then_some(items.len() as u32),
        }
    }
}

pub fn some_id(id: &str) -> Option<String> {
    if id == "-" { None } else { Some(id.to_string()) }
}

pub fn ids(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}{}", prefix, i)).collect()
}

#[async_trait]
impl LibraryApi for FakeLibrary {
    async fn saved_tracks(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<String>>, ApiError> {
        self.record("saved_tracks", format!("{}:{}", offset, limit))?;
        Ok(self.page(&self.liked, offset, limit))
    }

    async fn playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<PlaylistSummary>>, ApiError> {
        self.record("playlists", format!("{}:{}", offset, limit))?;
        let summaries: Vec<_> = self
            .playlists
            .iter()
            .map(|(p, _)| Some(p.clone()))
            .collect();
        Ok(self.page(&summaries, offset, limit))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<String>>, ApiError> {
        self.record(
            "playlist_tracks",
            format!("{}:{}:{}", playlist_id, offset, limit),
        )?;
        let tracks = self
            .playlists
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, t)| t.clone())
            .unwrap_or_default();
        Ok(self.page(&tracks, offset, limit))
    }

    async fn saved_albums(&self, offset: u32, limit: u32) -> Result<Page<AlbumSummary>, ApiError> {
        self.record("saved_albums", format!("{}:{}", offset, limit))?;
        let summaries: Vec<_> = self.albums.iter().map(|(a, _)| a.clone()).collect();
        Ok(self.page(&summaries, offset, limit))
    }

    async fn album_tracks(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<String>>, ApiError> {
        self.record("album_tracks", format!("{}:{}:{}", album_id, offset, limit))?;
        let tracks = self
            .albums
            .iter()
            .find(|(a, _)| a.id == album_id)
            .map(|(_, t)| t.clone())
            .unwrap_or_default();
        Ok(self.page(&tracks, offset, limit))
    }

    async fn followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<CursorPage<String>, ApiError> {
        self.record(
            "followed_artists",
            format!("{}:{}", after.clone().unwrap_or_default(), limit),
        )?;
        let start: usize = after.and_then(|a| a.parse().ok()).unwrap_or(0);
        let start = start.min(self.artists.len());
        let end = (start + limit as usize).min(self.artists.len());
        Ok(CursorPage {
            items: self.artists[start..end].to_vec(),
            next: (end < self.artists.len()).then(|| end.to_string()),
        })
    }

    async fn current_user(&self) -> Result<UserProfile, ApiError> {
        self.record("current_user", String::new())?;
        Ok(UserProfile {
            id: "fake-user".to_string(),
            display_name: Some("Fake User".to_string()),
            email: None,
            images: Vec::new(),
        })
    }

    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist, ApiError> {
        self.record("create_playlist", playlist.name.clone())?;
        let mut created = self.created.lock().unwrap();
        created.push(playlist.clone());
        let id = format!("new{}", created.len());
        Ok(CreatedPlaylist {
            url: format!("https://open.spotify.com/playlist/{}", id),
            id,
        })
    }

    async fn add_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ApiError> {
        self.record("add_playlist_tracks", format!("{}:{}", playlist_id, uris.len()))?;
        self.added
            .lock()
            .unwrap()
            .push((playlist_id.to_string(), uris.to_vec()));
        Ok(())
    }

    async fn save_tracks(&self, ids: &[String]) -> Result<(), ApiError> {
        self.record("save_tracks", ids.len().to_string())?;
        self.saved_batches.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    async fn save_albums(&self, ids: &[String]) -> Result<(), ApiError> {
        self.record("save_albums", ids.len().to_string())?;
        self.album_batches.lock().unwrap().push(ids.to_vec());
        Ok(())
    }

    async fn follow_artists(&self, ids: &[String]) -> Result<(), ApiError> {
        self.record("follow_artists", ids.len().to_string())?;
        self.artist_batches.lock().unwrap().push(ids.to_vec());
        Ok(())
    }
}

/// Drains every frame already sent and decodes its JSON payload.
pub fn drain_frames(
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<String>,
) -> Vec<serde_json::Value> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        let json = frame
            .strip_prefix("data: ")
            .and_then(|f| f.strip_suffix("\n\n"))
            .expect("frame format");
        frames.push(serde_json::from_str(json).expect("frame json"));
    }
    frames
}
