use crate::types::{
    AddTrackToPlaylistRequest, CreatePlaylistResponse, CreatedPlaylist, NewPlaylist, Page, Paging,
    PlaylistSummary, PlaylistTrackItem, SimplePlaylist, TrackId,
};

use super::{ApiError, SpotifyClient, error};

impl SpotifyClient {
    /// One page of the playlists in the user's library (`GET /me/playlists`).
    ///
    /// Spotify occasionally lists a playlist as `null` (deleted, or no longer
    /// visible to the user); those entries come back as `None`.
    pub async fn get_playlists(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<PlaylistSummary>>, ApiError> {
        let paging: Paging<Option<SimplePlaylist>> = self
            .get_json(&format!("/me/playlists?limit={}&offset={}", limit, offset))
            .await?;

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|entry| {
                    entry.map(|p| PlaylistSummary {
                        id: p.id,
                        name: p.name,
                        description: p.description,
                        public: p.public,
                    })
                })
                .collect(),
            total: paging.total,
        })
    }

    /// One page of a playlist's tracks. Local files and removed tracks have
    /// no id and come back as `None`.
    pub async fn get_playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        let paging: Paging<PlaylistTrackItem> = self
            .get_json(&format!(
                "/playlists/{}/tracks?limit={}&offset={}",
                playlist_id, limit, offset
            ))
            .await?;

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|item| item.track.and_then(|t| t.id))
                .collect(),
            total: paging.total,
        })
    }

    /// Creates a playlist owned by the token's user.
    pub async fn post_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist, ApiError> {
        let response = self
            .http
            .post(self.url("/me/playlists"))
            .bearer_auth(&self.token)
            .json(playlist)
            .send()
            .await?;

        let created = error::check(response)
            .await?
            .json::<CreatePlaylistResponse>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        Ok(CreatedPlaylist {
            id: created.id,
            url: created.external_urls.spotify,
        })
    }

    /// Appends up to 100 track URIs to a playlist.
    pub async fn post_playlist_tracks(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .bearer_auth(&self.token)
            .json(&AddTrackToPlaylistRequest {
                uris: uris.to_vec(),
            })
            .send()
            .await?;

        error::check(response).await.map(|_| ())
    }
}
