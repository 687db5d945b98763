use std::{net::SocketAddr, str::FromStr};

use axum::{
    Router,
    routing::{get, post},
};
use tower_cookies::{CookieManagerLayer, Key};

use crate::{
    Res,
    api::{self, AppState},
    config::Config,
    info, success, warning,
};

/// All routes of the app.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/auth", get(api::auth))
        .route("/api/callback", get(api::callback))
        .route("/api/user", get(api::user))
        .route("/api/logout", post(api::logout))
        .route("/api/fetch-data", post(api::fetch_data))
        .route("/api/fetch-data/sync", post(api::fetch_data_sync))
        .route("/api/migrate", post(api::migrate))
        .route("/api/migrate/sync", post(api::migrate_sync))
        .route("/api/create-mega-playlist", post(api::create_mega_playlist))
        .route(
            "/api/create-liked-songs-playlist",
            post(api::create_liked_songs_playlist),
        )
        .layer(CookieManagerLayer::new())
        .with_state(state)
}

/// Signing key for credential cookies. Without a configured secret every
/// restart invalidates all stored logins.
pub fn cookie_key(config: &Config) -> Res<Key> {
    match &config.cookie_secret {
        Some(secret) => Ok(Key::try_from(secret.as_bytes())?),
        None => {
            warning!("COOKIE_SECRET not set, using a random key; logins end with this process");
            Ok(Key::generate())
        }
    }
}

pub async fn start_api_server(config: Config, open_browser: bool) -> Res<()> {
    let addr = SocketAddr::from_str(&config.server_address)
        .map_err(|e| format!("Failed to parse server address: {}", e))?;
    let app_url = config.app_base_url();

    let key = cookie_key(&config)?;
    let app = router(AppState::new(config, key));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    success!("Listening on http://{}", addr);

    if open_browser {
        info!("Opening {} in the browser", app_url);
        if let Err(e) = webbrowser::open(&app_url) {
            warning!("Cannot open browser: {}", e);
        }
    }

    axum::serve(listener, app).await?;
    Ok(())
}
