use crate::types::UserProfile;

use super::{ApiError, SpotifyClient};

impl SpotifyClient {
    /// Profile of the token's owner (`GET /me`).
    pub async fn get_current_user(&self) -> Result<UserProfile, ApiError> {
        self.get_json("/me").await
    }
}
