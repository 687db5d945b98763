use crate::types::{
    AlbumId, AlbumSummary, Page, Paging, SavedAlbumItem, SavedTrackItem, TrackId, TrackRef,
};

use super::{ApiError, SpotifyClient, error};

impl SpotifyClient {
    /// One page of the user's liked songs (`GET /me/tracks`).
    pub async fn get_saved_tracks(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        let paging: Paging<SavedTrackItem> = self
            .get_json(&format!("/me/tracks?limit={}&offset={}", limit, offset))
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

    /// One page of the user's saved albums (`GET /me/albums`).
    pub async fn get_saved_albums(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Page<AlbumSummary>, ApiError> {
        let paging: Paging<SavedAlbumItem> = self
            .get_json(&format!("/me/albums?limit={}&offset={}", limit, offset))
            .await?;

        Ok(Page {
            items: paging
                .items
                .into_iter()
                .map(|item| AlbumSummary {
                    id: item.album.id,
                    name: item.album.name,
                })
                .collect(),
            total: paging.total,
        })
    }

    /// One page of an album's tracks (`GET /albums/{id}/tracks`).
    pub async fn get_album_tracks(
        &self,
        album_id: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Option<TrackId>>, ApiError> {
        let paging: Paging<TrackRef> = self
            .get_json(&format!(
                "/albums/{}/tracks?limit={}&offset={}",
                album_id, limit, offset
            ))
            .await?;

        Ok(Page {
            items: paging.items.into_iter().map(|t| t.id).collect(),
            total: paging.total,
        })
    }

    /// Adds up to 50 tracks to the user's liked songs.
    pub async fn put_saved_tracks(&self, ids: &[TrackId]) -> Result<(), ApiError> {
        self.put_ids("/me/tracks", ids).await
    }

    /// Saves up to 20 albums.
    ///
    /// The ids travel as a comma-joined `ids` query parameter with no body,
    /// unlike the other library writes.
    pub async fn put_saved_albums(&self, ids: &[AlbumId]) -> Result<(), ApiError> {
        let response = self
            .http
            .put(self.url("/me/albums"))
            .query(&[("ids", ids.join(","))])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_LENGTH, 0)
            .send()
            .await?;

        error::check(response).await.map(|_| ())
    }
}
