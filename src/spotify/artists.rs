use crate::types::{ArtistId, CursorPage, FollowedArtistsResponse};

use super::{ApiError, SpotifyClient};

impl SpotifyClient {
    /// Retrieves a page of followed artists (`GET /me/following`).
    ///
    /// The listing is cursor based: `after` is the cursor returned with the
    /// previous page, `None` for the first one. The returned `next` cursor is
    /// `None` once Spotify reports no further page.
    ///
    /// # Arguments
    ///
    /// * `after` - Cursor from the previous page, if any
    /// * `limit` - Maximum number of artists in this page (1-50)
    ///
    /// # Example
    ///
    /// ```
    /// let first = client.get_followed_artists(None, 50).await?;
    /// if let Some(cursor) = first.next {
    ///     let second = client.get_followed_artists(Some(cursor), 50).await?;
    /// }
    /// ```
    pub async fn get_followed_artists(
        &self,
        after: Option<String>,
        limit: u32,
    ) -> Result<CursorPage<ArtistId>, ApiError> {
        let mut path = format!("/me/following?type=artist&limit={}", limit);
        if let Some(after_val) = &after {
            path.push_str(&format!("&after={}", after_val));
        }

        let res: FollowedArtistsResponse = self.get_json(&path).await?;
        let next = match res.artists.next {
            Some(_) => res.artists.cursors.and_then(|c| c.after),
            None => None,
        };

        Ok(CursorPage {
            items: res.artists.items.into_iter().map(|a| a.id).collect(),
            next,
        })
    }

    /// Follows up to 50 artists. The ids go in a JSON `{"ids": [...]}` body.
    pub async fn put_followed_artists(&self, ids: &[ArtistId]) -> Result<(), ApiError> {
        self.put_ids("/me/following?type=artist", ids).await
    }
}
