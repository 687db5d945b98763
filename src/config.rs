//! Configuration management for spotmover.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Defaults for everything that has a sensible one
//!
//! Only the Spotify client credentials are mandatory.

use std::{env, path::PathBuf};

use thiserror::Error;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:3000/api/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Permissions needed to read one library and write another.
pub const DEFAULT_SCOPES: [&str; 8] = [
    "user-library-read",
    "user-library-modify",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
    "user-follow-read",
    "user-follow-modify",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scope: String,
    /// Key material for signing credential cookies; at least 64 bytes.
    pub cookie_secret: Option<String>,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let cookie_secret = get("COOKIE_SECRET");
        if let Some(secret) = &cookie_secret {
            if secret.len() < 64 {
                return Err(ConfigError::Invalid {
                    key: "COOKIE_SECRET",
                    reason: format!("needs at least 64 bytes, got {}", secret.len()),
                });
            }
        }

        let cookie_secure = match get("COOKIE_SECURE").as_deref() {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "COOKIE_SECURE",
                    reason: format!("expected true or false, got '{}'", other),
                });
            }
        };

        Ok(Self {
            server_address: or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            client_id: get("SPOTIFY_CLIENT_ID").ok_or(ConfigError::Missing("SPOTIFY_CLIENT_ID"))?,
            client_secret: get("SPOTIFY_CLIENT_SECRET")
                .ok_or(ConfigError::Missing("SPOTIFY_CLIENT_SECRET"))?,
            redirect_uri: or("SPOTIFY_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            auth_url: or("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: or("SPOTIFY_API_URL", DEFAULT_API_URL),
            scope: or("SPOTIFY_SCOPE", &DEFAULT_SCOPES.join(" ")),
            cookie_secret,
            cookie_secure,
        })
    }

    /// Where the browser app lives: the redirect URI without its callback path.
    pub fn app_base_url(&self) -> String {
        self.redirect_uri
            .trim_end_matches('/')
            .trim_end_matches("/api/callback")
            .to_string()
    }
}

/// Loads environment variables from `<local data dir>/spotmover/.env`.
///
/// Creates the directory if needed. A missing `.env` file is not an error;
/// the process environment alone may carry the configuration.
pub async fn load_env() -> Result<(), String> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    match dotenv::from_path(&path) {
        Ok(()) => Ok(()),
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!("cannot read {}: {}", path.display(), e)),
    }
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotmover/.env");
    path
}
