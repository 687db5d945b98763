use std::collections::HashMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;

use crate::{
    info,
    spotify::{self, LibraryApi},
    success,
    transfer::TransferError,
    types::{FlowMode, Role},
    utils, warning,
};

use super::{AppState, found, json_error, parse_body};

const INVALID_ACCOUNT: &str = "Invalid account parameter";

#[derive(Debug, Default, Deserialize)]
struct LogoutRequest {
    account: Option<String>,
}

fn role_param(params: &HashMap<String, String>) -> Result<Role, Response> {
    params
        .get("account")
        .and_then(|a| a.parse::<Role>().ok())
        .ok_or_else(|| json_error(StatusCode::BAD_REQUEST, INVALID_ACCOUNT))
}

/// Redirects to the Spotify login for the requested account.
pub async fn auth(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let role = match role_param(&params) {
        Ok(role) => role,
        Err(response) => return response,
    };
    let mode = params.get("mode").and_then(|m| m.parse::<FlowMode>().ok());

    let auth_state = utils::encode_state(role, mode, Utc::now());
    match spotify::auth::authorize_url(&state.config, &auth_state) {
        Ok(url) => {
            info!("Starting Spotify login for {} account", role);
            found(&url)
        }
        Err(e) => json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Completes the login: exchanges the code, stores the credentials and sends
/// the browser back to the app with the next step in the query.
pub async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let base = state.config.app_base_url();

    if let Some(error) = params.get("error") {
        warning!("Spotify login refused: {}", error);
        return app_redirect(&base, &[("error", error.as_str())]);
    }

    let (Some(code), Some(raw_state)) = (params.get("code"), params.get("state")) else {
        return app_redirect(&base, &[("error", "missing_params")]);
    };

    let auth_state = match utils::parse_state(raw_state) {
        Ok(parsed) => parsed,
        Err(e) => {
            warning!("Rejected login callback: {}", e);
            return app_redirect(&base, &[("error", "invalid_state")]);
        }
    };

    let token = match spotify::auth::exchange_code(&state.http, &state.config, code).await {
        Ok(token) => token,
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            return app_redirect(&base, &[("error", "auth_failed")]);
        }
    };

    state.credentials(&cookies).store(auth_state.role, &token);
    success!("{} account connected", auth_state.role);

    let role = auth_state.role.as_str();
    let mut query = vec![("account", role), ("status", "connected")];
    if let Some(mode) = auth_state.mode {
        query.push(("mode", mode.as_str()));
        query.push((
            "step",
            match auth_state.role {
                Role::Source => "fetch-data",
                Role::Target => "migrate",
            },
        ));
    }
    app_redirect(&base, &query)
}

/// Profile of the connected account.
pub async fn user(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let role = match role_param(&params) {
        Ok(role) => role,
        Err(response) => return response,
    };

    let client = match state.client_for(&cookies, role).await {
        Ok(client) => client,
        Err(e) => return e.into_response(),
    };

    match client.current_user().await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            warning!("Cannot fetch {} profile: {}", role, e);
            TransferError::from(e).into_response()
        }
    }
}

/// Forgets the stored credentials of one account. Spotify is not contacted.
pub async fn logout(State(state): State<AppState>, cookies: Cookies, body: Bytes) -> Response {
    let request: LogoutRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let Some(role) = request.account.and_then(|a| a.parse::<Role>().ok()) else {
        return json_error(StatusCode::BAD_REQUEST, INVALID_ACCOUNT);
    };

    state.credentials(&cookies).clear(role);
    info!("{} account disconnected", role);
    Json(json!({ "success": true })).into_response()
}

fn app_redirect(base: &str, query: &[(&str, &str)]) -> Response {
    match Url::parse_with_params(&format!("{}/", base), query) {
        Ok(url) => found(url.as_str()),
        Err(e) => {
            warning!("Cannot build redirect from {}: {}", base, e);
            found("/")
        }
    }
}
