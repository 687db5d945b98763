use std::collections::HashSet;

use tokio::time::sleep;

use crate::{
    info,
    spotify::LibraryApi,
    success,
    types::{AlbumSummary, CollectMode, LibrarySnapshot, PlaylistSnapshot, PoolSource, TrackId},
};

use super::{
    ALBUM_TRACKS_PAGE, CursorPaginator, FOLLOWED_ARTISTS_PAGE, OffsetPaginator, PACE,
    PLAYLIST_TRACKS_PAGE, PLAYLISTS_PAGE, ProgressReporter, SAVED_ALBUMS_PAGE, SAVED_TRACKS_PAGE,
    TransferError,
};

/// Insertion-ordered set of track ids.
#[derive(Debug, Default, Clone)]
pub struct TrackPool {
    seen: HashSet<TrackId>,
    order: Vec<TrackId>,
}

impl TrackPool {
    /// Adds `id` unless already pooled. Returns whether it was new.
    pub fn insert(&mut self, id: TrackId) -> bool {
        if self.seen.contains(&id) {
            return false;
        }
        self.seen.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Inserts every id in order, skipping those already pooled.
    pub fn extend<I: IntoIterator<Item = TrackId>>(&mut self, ids: I) {
        for id in ids {
            self.insert(id);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_vec(self) -> Vec<TrackId> {
        self.order
    }
}

/// Reads the source library into a snapshot for replay.
///
/// Categories are read one after another: liked songs, then (full mode)
/// every playlist with its complete track list, saved albums and followed
/// artists. Nothing is deduplicated across categories.
pub async fn collect_library<C: LibraryApi>(
    client: &C,
    mode: CollectMode,
    progress: &ProgressReporter,
) -> Result<LibrarySnapshot, TransferError> {
    progress.emit("Starting...", 0, None);

    let saved_tracks = liked_songs(client, progress).await?;
    info!("Fetched {} liked songs", saved_tracks.len());
    progress.emit("Liked songs fetched", saved_tracks.len(), None);

    if mode == CollectMode::LikedOnly {
        return Ok(LibrarySnapshot {
            saved_tracks,
            ..LibrarySnapshot::default()
        });
    }

    let playlists = playlists(client, progress).await?;
    info!("Fetched {} playlists", playlists.len());

    progress.emit("Fetching albums...", 0, None);
    let albums = saved_albums(client, progress).await?;
    let saved_albums: Vec<_> = albums.into_iter().map(|a| a.id).collect();
    info!("Fetched {} saved albums", saved_albums.len());

    progress.emit("Fetching followed artists...", 0, None);
    let followed_artists = followed_artists(client, progress).await?;
    info!("Fetched {} followed artists", followed_artists.len());

    let snapshot = LibrarySnapshot {
        saved_tracks,
        playlists,
        saved_albums,
        followed_artists,
    };
    success!("Library collected");
    Ok(snapshot)
}

/// Pools track ids for a consolidation playlist, each id once, in the order
/// first seen.
pub async fn collect_pool<C: LibraryApi>(
    client: &C,
    source: PoolSource,
    progress: &ProgressReporter,
) -> Result<Vec<TrackId>, TransferError> {
    progress.emit("Starting...", 0, None);
    let mut pool = TrackPool::default();

    pool.extend(liked_songs(client, progress).await?);
    info!("Found {} liked songs", pool.len());
    progress.emit("Liked songs fetched", pool.len(), None);

    if source == PoolSource::LikedOnly {
        return Ok(pool.into_vec());
    }

    progress.emit("Fetching playlists...", pool.len(), None);
    let playlists: Vec<_> = OffsetPaginator::new(PLAYLISTS_PAGE, move |offset, limit| {
        client.playlists(offset, limit)
    })
    .collect_all()
    .await?
    .into_iter()
    .flatten()
    .collect();

    progress.emit(
        format!("Fetching tracks from {} playlists...", playlists.len()),
        pool.len(),
        None,
    );
    for playlist in &playlists {
        progress.emit(
            format!("Playlist: {}", playlist.name),
            pool.len(),
            Some(playlists.len()),
        );
        pool.extend(playlist_track_ids(client, &playlist.id).await?);
    }
    info!("Total unique tracks after playlists: {}", pool.len());
    progress.emit("All playlists processed", pool.len(), None);

    progress.emit("Fetching albums...", pool.len(), None);
    let albums = saved_albums(client, progress).await?;
    for (i, album) in albums.iter().enumerate() {
        if i > 0 {
            sleep(PACE).await;
        }
        progress.emit(format!("Album: {}", album.name), pool.len(), None);
        let album_id = album.id.as_str();
        let tracks = OffsetPaginator::new(ALBUM_TRACKS_PAGE, move |offset, limit| {
            client.album_tracks(album_id, offset, limit)
        })
        .collect_all()
        .await?;
        pool.extend(tracks.into_iter().flatten());
    }
    info!("Total unique tracks after albums: {}", pool.len());
    progress.emit("All albums processed", pool.len(), None);

    Ok(pool.into_vec())
}

async fn liked_songs<C: LibraryApi>(
    client: &C,
    progress: &ProgressReporter,
) -> Result<Vec<TrackId>, TransferError> {
    progress.emit("Fetching liked songs...", 0, None);

    let mut pages = OffsetPaginator::new(SAVED_TRACKS_PAGE, move |offset, limit| {
        client.saved_tracks(offset, limit)
    });
    let mut ids = Vec::new();
    while let Some(page) = pages.next_page().await? {
        ids.extend(page.into_iter().flatten());
        progress.emit(
            "Fetching liked songs...",
            ids.len(),
            pages.total().map(|t| t as usize),
        );
    }

    Ok(ids)
}

async fn playlists<C: LibraryApi>(
    client: &C,
    progress: &ProgressReporter,
) -> Result<Vec<PlaylistSnapshot>, TransferError> {
    progress.emit("Fetching playlists...", 0, None);

    let mut pages = OffsetPaginator::new(PLAYLISTS_PAGE, move |offset, limit| {
        client.playlists(offset, limit)
    });
    let mut playlists = Vec::new();
    while let Some(page) = pages.next_page().await? {
        for summary in page.into_iter().flatten() {
            progress.emit(
                format!("Playlist: {}", summary.name),
                playlists.len(),
                pages.total().map(|t| t as usize),
            );
            let tracks = playlist_track_ids(client, &summary.id).await?;
            playlists.push(PlaylistSnapshot {
                name: summary.name,
                description: summary.description.unwrap_or_default(),
                tracks,
                is_public: summary.public.unwrap_or(false),
            });
        }
    }

    progress.emit("All playlists processed", playlists.len(), None);
    Ok(playlists)
}

async fn playlist_track_ids<C: LibraryApi>(
    client: &C,
    playlist_id: &str,
) -> Result<Vec<TrackId>, TransferError> {
    let tracks = OffsetPaginator::new(PLAYLIST_TRACKS_PAGE, move |offset, limit| {
        client.playlist_tracks(playlist_id, offset, limit)
    })
    .collect_all()
    .await?;

    Ok(tracks.into_iter().flatten().collect())
}

async fn saved_albums<C: LibraryApi>(
    client: &C,
    progress: &ProgressReporter,
) -> Result<Vec<AlbumSummary>, TransferError> {
    let mut pages = OffsetPaginator::new(SAVED_ALBUMS_PAGE, move |offset, limit| {
        client.saved_albums(offset, limit)
    });
    let mut albums = Vec::new();
    while let Some(page) = pages.next_page().await? {
        albums.extend(page);
        progress.emit(
            "Fetching albums...",
            albums.len(),
            pages.total().map(|t| t as usize),
        );
    }

    Ok(albums)
}

async fn followed_artists<C: LibraryApi>(
    client: &C,
    progress: &ProgressReporter,
) -> Result<Vec<String>, TransferError> {
    let mut pages = CursorPaginator::new(FOLLOWED_ARTISTS_PAGE, move |after, limit| {
        client.followed_artists(after, limit)
    });
    let mut artists = Vec::new();
    while let Some(page) = pages.next_page().await? {
        artists.extend(page);
        progress.emit("Fetching followed artists...", artists.len(), None);
    }

    Ok(artists)
}
