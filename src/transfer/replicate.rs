use std::future::Future;

use chrono::{DateTime, Local};
use tokio::time::sleep;

use crate::{
    info,
    spotify::{ApiError, LibraryApi},
    success,
    types::{
        Category, CategoryFailure, ConsolidatedPlaylist, LibrarySnapshot, MigrationResult,
        NewPlaylist, PlaylistSnapshot, PoolSource,
    },
    utils, warning,
};

use super::{
    FOLLOW_ARTISTS_BATCH, PACE, PLAYLIST_TRACKS_BATCH, ProgressReporter, RetryPolicy,
    SAVED_ALBUMS_BATCH, SAVED_TRACKS_BATCH, TransferError,
};

/// What one category managed to write before it finished or gave up.
#[derive(Debug)]
pub struct CategoryOutcome {
    pub written: usize,
    pub error: Option<ApiError>,
}

impl CategoryOutcome {
    fn done(written: usize) -> Self {
        Self {
            written,
            error: None,
        }
    }

    fn aborted(written: usize, error: ApiError) -> Self {
        Self {
            written,
            error: Some(error),
        }
    }
}

/// Replays a snapshot into the target account.
///
/// Categories run in order: liked songs, playlists, albums, artists. A
/// permanent failure stops the rest of its category and is recorded in the
/// result; earlier writes stay in place and the next category still runs.
/// A rejected access token ends the whole run.
pub async fn replicate_library<C: LibraryApi>(
    client: &C,
    snapshot: &LibrarySnapshot,
    progress: &ProgressReporter,
) -> Result<MigrationResult, TransferError> {
    let mut result = MigrationResult::default();

    let outcome = save_liked_songs(client, &snapshot.saved_tracks, progress).await;
    result.liked_songs = settle(&mut result.failures, Category::LikedSongs, outcome)?;

    let outcome = copy_playlists(client, &snapshot.playlists, progress).await;
    result.playlists = settle(&mut result.failures, Category::Playlists, outcome)?;

    let outcome = save_albums(client, &snapshot.saved_albums, progress).await;
    result.albums = settle(&mut result.failures, Category::Albums, outcome)?;

    let outcome = follow_artists(client, &snapshot.followed_artists, progress).await;
    result.artists = settle(&mut result.failures, Category::Artists, outcome)?;

    success!(
        "Migration finished: {} liked songs, {} playlists, {} albums, {} artists",
        result.liked_songs,
        result.playlists,
        result.albums,
        result.artists
    );
    Ok(result)
}

fn settle(
    failures: &mut Vec<CategoryFailure>,
    category: Category,
    outcome: CategoryOutcome,
) -> Result<usize, TransferError> {
    match outcome.error {
        None => Ok(outcome.written),
        Some(err) if err.is_auth() => Err(TransferError::Api(err)),
        Some(err) => {
            warning!(
                "Migrating {} stopped after {} items: {}",
                category,
                outcome.written,
                err
            );
            failures.push(CategoryFailure {
                category,
                message: err.to_string(),
            });
            Ok(outcome.written)
        }
    }
}

/// Adds liked songs to the target, 50 per call. Empty ids are dropped
/// first; `written` counts the ids actually saved.
pub async fn save_liked_songs<C: LibraryApi>(
    client: &C,
    ids: &[String],
    progress: &ProgressReporter,
) -> CategoryOutcome {
    let ids = utils::valid_ids(ids);
    info!("Migrating {} liked songs...", ids.len());
    progress.emit("Migrating liked songs...", 0, Some(ids.len()));

    let report = Some((progress, "Migrating liked songs..."));
    write_batches(&ids, SAVED_TRACKS_BATCH, report, |batch| client.save_tracks(batch)).await
}

/// Recreates each playlist on the target. Playlists without a single valid
/// track are skipped and not counted.
pub async fn copy_playlists<C: LibraryApi>(
    client: &C,
    playlists: &[PlaylistSnapshot],
    progress: &ProgressReporter,
) -> CategoryOutcome {
    let retry = RetryPolicy::default();
    let mut created = 0;
    info!("Migrating {} playlists...", playlists.len());
    progress.emit("Migrating playlists...", 0, Some(playlists.len()));

    for playlist in playlists {
        let uris: Vec<String> = utils::valid_ids(&playlist.tracks)
            .iter()
            .map(|id| utils::track_uri(id))
            .collect();
        if uris.is_empty() {
            info!("Skipping playlist '{}' without tracks", playlist.name);
            continue;
        }

        progress.emit(
            format!("Playlist: {}", playlist.name),
            created,
            Some(playlists.len()),
        );
        let request = NewPlaylist {
            name: playlist.name.clone(),
            description: playlist.description.clone(),
            public: playlist.is_public,
        };
        let new_playlist = match retry.run(|| client.create_playlist(&request)).await {
            Ok(p) => p,
            Err(e) => return CategoryOutcome::aborted(created, e),
        };

        let playlist_id = new_playlist.id.as_str();
        let outcome = write_batches(&uris, PLAYLIST_TRACKS_BATCH, None, |batch| {
            client.add_playlist_tracks(playlist_id, batch)
        })
        .await;
        if let Some(e) = outcome.error {
            return CategoryOutcome::aborted(created, e);
        }

        created += 1;
        sleep(PACE).await;
    }

    CategoryOutcome::done(created)
}

/// Saves albums 20 at a time.
pub async fn save_albums<C: LibraryApi>(
    client: &C,
    ids: &[String],
    progress: &ProgressReporter,
) -> CategoryOutcome {
    let ids = utils::valid_ids(ids);
    info!("Migrating {} saved albums...", ids.len());
    progress.emit("Migrating albums...", 0, Some(ids.len()));

    let report = Some((progress, "Migrating albums..."));
    write_batches(&ids, SAVED_ALBUMS_BATCH, report, |batch| client.save_albums(batch)).await
}

/// Follows artists on the target, 50 per call.
pub async fn follow_artists<C: LibraryApi>(
    client: &C,
    ids: &[String],
    progress: &ProgressReporter,
) -> CategoryOutcome {
    let ids = utils::valid_ids(ids);
    info!("Migrating {} followed artists...", ids.len());
    progress.emit("Migrating artists...", 0, Some(ids.len()));

    let report = Some((progress, "Migrating artists..."));
    write_batches(&ids, FOLLOW_ARTISTS_BATCH, report, |batch| client.follow_artists(batch)).await
}

/// Creates one new playlist holding `track_ids` in order.
///
/// The playlist is public, named `<title> - <YYYY-MM-DD>` after `source`,
/// and its description states the track count. Tracks go in 100 per call.
///
/// # Errors
///
/// * [`TransferError::NothingToTransfer`] when no valid id is left; no
///   playlist is created then.
/// * [`TransferError::Api`] when creating the playlist or a batch fails for
///   good. Batches already added stay in the playlist.
pub async fn consolidate<C: LibraryApi>(
    client: &C,
    track_ids: &[String],
    source: PoolSource,
    progress: &ProgressReporter,
) -> Result<ConsolidatedPlaylist, TransferError> {
    consolidate_at(client, track_ids, source, Local::now(), progress).await
}

/// [`consolidate`] with an explicit clock for the name and description.
pub async fn consolidate_at<C: LibraryApi>(
    client: &C,
    track_ids: &[String],
    source: PoolSource,
    now: DateTime<Local>,
    progress: &ProgressReporter,
) -> Result<ConsolidatedPlaylist, TransferError> {
    let uris: Vec<String> = utils::valid_ids(track_ids)
        .iter()
        .map(|id| utils::track_uri(id))
        .collect();
    if uris.is_empty() {
        return Err(TransferError::NothingToTransfer);
    }

    progress.emit("Creating playlist...", uris.len(), None);
    let request = NewPlaylist {
        name: utils::playlist_label(source.playlist_title(), now),
        description: source.describe(uris.len(), &now.format("%Y-%m-%d %H:%M").to_string()),
        public: true,
    };
    let playlist = RetryPolicy::default()
        .run(|| client.create_playlist(&request))
        .await?;
    success!("Playlist created: {} ({})", request.name, playlist.id);
    progress.emit("Playlist created, adding tracks...", uris.len(), None);

    let playlist_id = playlist.id.as_str();
    let total = uris.len();
    let report = Some((progress, "Adding tracks..."));
    let outcome = write_batches(&uris, PLAYLIST_TRACKS_BATCH, report, |batch| {
        client.add_playlist_tracks(playlist_id, batch)
    })
    .await;
    if let Some(e) = outcome.error {
        return Err(e.into());
    }
    success!("Added {} tracks to {}", total, request.name);

    Ok(ConsolidatedPlaylist {
        playlist_id: playlist.id,
        playlist_url: playlist.url,
        total_tracks: total,
    })
}

/// Writes `items` in sequential chunks of at most `cap`, pausing between
/// chunks and retrying transient failures. Stops at the first permanent
/// failure. With `report` set, the running count is emitted after every
/// chunk under the given stage label.
async fn write_batches<'a, F, Fut>(
    items: &'a [String],
    cap: usize,
    report: Option<(&ProgressReporter, &str)>,
    mut write: F,
) -> CategoryOutcome
where
    F: FnMut(&'a [String]) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let retry = RetryPolicy::default();
    let mut written = 0;

    for (i, batch) in items.chunks(cap).enumerate() {
        if i > 0 {
            sleep(PACE).await;
        }
        if let Err(e) = retry.run(|| write(batch)).await {
            return CategoryOutcome::aborted(written, e);
        }
        written += batch.len();
        if let Some((progress, stage)) = report {
            progress.emit(stage, written, Some(items.len()));
        }
    }

    CategoryOutcome::done(written)
}
