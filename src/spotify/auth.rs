use chrono::Utc;
use reqwest::{Client, Url};

use crate::{
    config::Config,
    types::{Token, TokenResponse},
};

use super::{ApiError, error};

/// Builds the Spotify authorize URL the browser is redirected to.
///
/// `state` is handed back untouched on the callback; it tells the callback
/// which account role and mode started the flow (see
/// [`crate::utils::encode_state`]).
pub fn authorize_url(config: &Config, state: &str) -> Result<String, ApiError> {
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("scope", config.scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| ApiError::Decode(format!("invalid authorize url: {}", e)))?;

    Ok(url.to_string())
}

/// Exchanges an authorization code for an access and refresh token.
///
/// The authorization code is single-use and short-lived; the exchange
/// happens right inside the callback request.
pub async fn exchange_code(http: &Client, config: &Config, code: &str) -> Result<Token, ApiError> {
    let response = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let json = read_token(response).await?;
    let refresh_token = json
        .refresh_token
        .ok_or_else(|| ApiError::Decode("token response without refresh_token".to_string()))?;

    Ok(Token {
        access_token: json.access_token,
        refresh_token,
        scope: json.scope,
        expires_in: json.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    })
}

/// Refreshes an expired access token.
///
/// Spotify may or may not rotate the refresh token; when the response
/// carries none the previous one stays valid and is kept.
pub async fn refresh_token(
    http: &Client,
    config: &Config,
    refresh_token: &str,
) -> Result<Token, ApiError> {
    let response = http
        .post(&config.token_url)
        .basic_auth(&config.client_id, Some(&config.client_secret))
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .send()
        .await?;

    let json = read_token(response).await?;

    Ok(Token {
        access_token: json.access_token,
        refresh_token: json
            .refresh_token
            .unwrap_or_else(|| refresh_token.to_string()),
        scope: json.scope,
        expires_in: json.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    })
}

async fn read_token(response: reqwest::Response) -> Result<TokenResponse, ApiError> {
    error::check(response)
        .await?
        .json::<TokenResponse>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}
