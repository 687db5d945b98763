use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    info,
    spotify::SpotifyClient,
    transfer::{
        ProgressReporter, TransferError, collect_library, collect_pool, consolidate,
        replicate_library,
    },
    types::{CollectMode, LibraryCounts, LibrarySnapshot, MigrationResult, PoolSource, Role},
    warning,
};

use super::{AppState, parse_body, spawn_stream, success};

#[derive(Debug, Default, Deserialize)]
struct FetchRequest {
    #[serde(default)]
    mode: CollectMode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigrateRequest {
    migration_data: Option<LibrarySnapshot>,
}

#[derive(Serialize)]
struct Collected {
    data: LibrarySnapshot,
    counts: LibraryCounts,
}

impl From<LibrarySnapshot> for Collected {
    fn from(data: LibrarySnapshot) -> Self {
        Self {
            counts: data.counts(),
            data,
        }
    }
}

#[derive(Serialize)]
struct Migrated {
    results: MigrationResult,
}

/// Streams a collection of the source library. The final record carries the
/// snapshot for the browser to hold on to.
pub async fn fetch_data(State(state): State<AppState>, cookies: Cookies, body: Bytes) -> Response {
    let request: FetchRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let client = state.client_for(&cookies, Role::Source).await;

    spawn_stream(move |progress| async move {
        let Some(client) = connected(client, &progress) else {
            return;
        };
        info!("Collecting source library ({:?})", request.mode);
        match collect_library(&client, request.mode, &progress).await {
            Ok(snapshot) => progress.complete(&Collected::from(snapshot)),
            Err(e) => report_failure(&progress, "Collecting", &e),
        }
    })
}

/// [`fetch_data`] answered as one JSON body: `{success, data, counts}`.
pub async fn fetch_data_sync(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Bytes,
) -> Response {
    let request: FetchRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = async {
        let client = state.client_for(&cookies, Role::Source).await?;
        collect_library(&client, request.mode, &ProgressReporter::silent()).await
    }
    .await;

    match result {
        Ok(snapshot) => success(Collected::from(snapshot)),
        Err(e) => e.into_response(),
    }
}

/// Streams the replay of a snapshot into the target account.
pub async fn migrate(State(state): State<AppState>, cookies: Cookies, body: Bytes) -> Response {
    let request: MigrateRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    // Without a snapshot there is nothing to do; fail before any token refresh.
    let Some(snapshot) = request.migration_data else {
        return spawn_stream(|progress| async move {
            progress.fail(TransferError::MissingSnapshot);
        });
    };
    let client = state.client_for(&cookies, Role::Target).await;

    spawn_stream(move |progress| async move {
        let Some(client) = connected(client, &progress) else {
            return;
        };
        progress.emit("Starting migration...", 0, None);
        match replicate_library(&client, &snapshot, &progress).await {
            Ok(results) => progress.complete(&Migrated { results }),
            Err(e) => report_failure(&progress, "Migration", &e),
        }
    })
}

/// [`migrate`] answered as one JSON body: `{success, results}`.
pub async fn migrate_sync(State(state): State<AppState>, cookies: Cookies, body: Bytes) -> Response {
    let request: MigrateRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let result = async {
        let snapshot = request
            .migration_data
            .ok_or(TransferError::MissingSnapshot)?;
        let client = state.client_for(&cookies, Role::Target).await?;
        replicate_library(&client, &snapshot, &ProgressReporter::silent()).await
    }
    .await;

    match result {
        Ok(results) => success(Migrated { results }),
        Err(e) => e.into_response(),
    }
}

/// Streams the creation of one playlist holding every distinct track the
/// source account has saved, in playlists or in saved albums.
pub async fn create_mega_playlist(State(state): State<AppState>, cookies: Cookies) -> Response {
    pooled_playlist(state, cookies, PoolSource::Everything).await
}

/// Streams the creation of one playlist holding the source account's liked
/// songs.
pub async fn create_liked_songs_playlist(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Response {
    pooled_playlist(state, cookies, PoolSource::LikedOnly).await
}

async fn pooled_playlist(state: AppState, cookies: Cookies, source: PoolSource) -> Response {
    let client = state.client_for(&cookies, Role::Source).await;

    spawn_stream(move |progress| async move {
        let Some(client) = connected(client, &progress) else {
            return;
        };
        let result = async {
            let track_ids = collect_pool(&client, source, &progress).await?;
            info!("Pooled {} tracks", track_ids.len());
            consolidate(&client, &track_ids, source, &progress).await
        }
        .await;

        match result {
            Ok(playlist) => progress.complete(&playlist),
            Err(e) => report_failure(&progress, "Playlist creation", &e),
        }
    })
}

fn connected(
    client: Result<SpotifyClient, TransferError>,
    progress: &ProgressReporter,
) -> Option<SpotifyClient> {
    match client {
        Ok(client) => Some(client),
        Err(e) => {
            warning!("{}", e);
            progress.fail("Not authenticated");
            None
        }
    }
}

fn report_failure(progress: &ProgressReporter, what: &str, e: &TransferError) {
    warning!("{} failed: {}", what, e);
    progress.fail(e);
}
