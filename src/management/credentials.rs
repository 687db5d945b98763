use chrono::Utc;
use reqwest::Client;
use tower_cookies::{
    Cookie, Cookies, Key, SignedCookies,
    cookie::{SameSite, time},
};

use crate::{
    config::Config, info, spotify::auth, transfer::TransferError, types::Role, types::Token,
    warning,
};

/// Lifetime of the refresh token cookie.
pub const REFRESH_TOKEN_DAYS: i64 = 30;

/// Refresh this long before the access token actually runs out.
pub const REFRESH_BUFFER_SECS: i64 = 240;

/// Per-browser Spotify credentials, kept in signed http-only cookies.
///
/// Each role owns three cookies: `<role>_access_token`,
/// `<role>_refresh_token` and `<role>_expires_at` (unix millis).
pub struct CredentialStore<'a> {
    cookies: &'a Cookies,
    key: &'a Key,
    secure: bool,
}

impl<'a> CredentialStore<'a> {
    pub fn new(cookies: &'a Cookies, key: &'a Key, secure: bool) -> Self {
        Self {
            cookies,
            key,
            secure,
        }
    }

    fn jar(&self) -> SignedCookies<'a> {
        self.cookies.signed(self.key)
    }

    /// Writes all three cookies for `role`.
    ///
    /// The access token and its expiry live as long as the token itself; the
    /// refresh token is kept for [`REFRESH_TOKEN_DAYS`].
    pub fn store(&self, role: Role, token: &Token) {
        let lifetime = time::Duration::seconds(token.expires_in as i64);
        let jar = self.jar();

        jar.add(self.cookie(access_name(role), token.access_token.clone(), lifetime));
        jar.add(self.cookie(
            refresh_name(role),
            token.refresh_token.clone(),
            time::Duration::days(REFRESH_TOKEN_DAYS),
        ));
        jar.add(self.cookie(
            expires_name(role),
            token.expires_at_millis().to_string(),
            lifetime,
        ));
    }

    pub fn access_token(&self, role: Role) -> Option<String> {
        self.value(access_name(role))
    }

    pub fn refresh_token(&self, role: Role) -> Option<String> {
        self.value(refresh_name(role))
    }

    pub fn expires_at(&self, role: Role) -> Option<i64> {
        self.value(expires_name(role))?.parse().ok()
    }

    /// Returns a usable access token for `role`, refreshing it first when it
    /// is gone or about to expire and a refresh token is at hand.
    ///
    /// A token counts as about to expire within [`REFRESH_BUFFER_SECS`] of
    /// its expiry. A successful refresh rewrites the cookies. If the refresh
    /// fails the current access token is still returned when there is one.
    ///
    /// # Errors
    ///
    /// [`TransferError::NotAuthenticated`] when no access token is left and
    /// none could be obtained.
    pub async fn valid_access_token(
        &self,
        role: Role,
        http: &Client,
        config: &Config,
    ) -> Result<String, TransferError> {
        let access = self.access_token(role);
        let fresh = match self.expires_at(role) {
            Some(at) => Utc::now().timestamp_millis() + REFRESH_BUFFER_SECS * 1000 < at,
            None => true,
        };
        if let (Some(token), true) = (&access, fresh) {
            return Ok(token.clone());
        }

        let Some(refresh) = self.refresh_token(role) else {
            return access.ok_or(TransferError::NotAuthenticated(role));
        };

        match auth::refresh_token(http, config, &refresh).await {
            Ok(token) => {
                info!("Refreshed {} access token", role);
                self.store(role, &token);
                Ok(token.access_token)
            }
            Err(e) => {
                warning!("Cannot refresh {} access token: {}", role, e);
                access.ok_or(TransferError::NotAuthenticated(role))
            }
        }
    }

    /// Forgets everything stored for `role`.
    pub fn clear(&self, role: Role) {
        let jar = self.jar();
        for name in [access_name(role), refresh_name(role), expires_name(role)] {
            let mut cookie = Cookie::new(name, "");
            cookie.set_path("/");
            jar.remove(cookie);
        }
    }

    fn value(&self, name: String) -> Option<String> {
        self.jar()
            .get(&name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
    }

    fn cookie(&self, name: String, value: String, max_age: time::Duration) -> Cookie<'static> {
        let mut cookie = Cookie::new(name, value);
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_same_site(SameSite::Lax);
        cookie.set_secure(self.secure);
        cookie.set_max_age(max_age);
        cookie
    }
}

pub fn access_name(role: Role) -> String {
    format!("{}_access_token", role)
}

pub fn refresh_name(role: Role) -> String {
    format!("{}_refresh_token", role)
}

pub fn expires_name(role: Role) -> String {
    format!("{}_expires_at", role)
}
