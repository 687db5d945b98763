//! Axum stand-in for the Spotify accounts service and Web API.
//!
//! Serves a tiny fixed library, records every request and can be told to
//! fail the next call to a path.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const ACCESS_TOKEN: &str = "access-1";
pub const REFRESHED_TOKEN: &str = "access-2";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const ROTATED_REFRESH_TOKEN: &str = "refresh-2";

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

struct Backend {
    expires_in: u64,
    refresh_fails: bool,
    rotate_refresh: bool,
    failures: HashMap<String, VecDeque<(StatusCode, String)>>,
    grants: Vec<HashMap<String, String>>,
    requests: Vec<Recorded>,
    created: usize,
}

type Shared = Arc<Mutex<Backend>>;

#[derive(Clone)]
pub struct FakeSpotify {
    pub base: String,
    backend: Shared,
}

impl FakeSpotify {
    pub async fn start() -> Self {
        let backend = Arc::new(Mutex::new(Backend {
            expires_in: 3600,
            refresh_fails: false,
            rotate_refresh: false,
            failures: HashMap::new(),
            grants: Vec::new(),
            requests: Vec::new(),
            created: 0,
        }));

        let app = Router::new()
            .route("/api/token", post(token))
            .fallback(web_api)
            .with_state(backend.clone());

        Self {
            base: serve(app).await,
            backend,
        }
    }

    pub fn token_url(&self) -> String {
        format!("{}/api/token", self.base)
    }

    pub fn api_url(&self) -> String {
        format!("{}/v1", self.base)
    }

    /// Lifetime of the access tokens handed out by the code exchange.
    pub fn set_expires_in(&self, secs: u64) {
        self.backend.lock().unwrap().expires_in = secs;
    }

    pub fn reject_refresh(&self) {
        self.backend.lock().unwrap().refresh_fails = true;
    }

    pub fn rotate_refresh(&self) {
        self.backend.lock().unwrap().rotate_refresh = true;
    }

    /// Answers the next request to `path` (below `/v1`) with `status` and
    /// `body` instead of the library content.
    pub fn fail_next(&self, path: &str, status: StatusCode, body: &str) {
        self.backend
            .lock()
            .unwrap()
            .failures
            .entry(path.to_string())
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Form bodies posted to the token endpoint, in order.
    pub fn grants(&self) -> Vec<HashMap<String, String>> {
        self.backend.lock().unwrap().grants.clone()
    }

    pub fn refresh_grants(&self) -> Vec<HashMap<String, String>> {
        self.grants()
            .into_iter()
            .filter(|g| g.get("grant_type").map(String::as_str) == Some("refresh_token"))
            .collect()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.backend.lock().unwrap().requests.clone()
    }

    /// Every non-GET request to the Web API.
    pub fn writes(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::GET)
            .collect()
    }
}

async fn token(State(backend): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    let mut backend = backend.lock().unwrap();
    backend.grants.push(form.clone());

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") => Json(json!({
            "access_token": ACCESS_TOKEN,
            "refresh_token": REFRESH_TOKEN,
            "scope": "user-library-read user-library-modify",
            "expires_in": backend.expires_in
        }))
        .into_response(),
        Some("refresh_token") if backend.refresh_fails => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Refresh token revoked"})),
        )
            .into_response(),
        Some("refresh_token") => {
            let mut body = json!({
                "access_token": REFRESHED_TOKEN,
                "scope": "user-library-read user-library-modify",
                "expires_in": 3600
            });
            if backend.rotate_refresh {
                body["refresh_token"] = json!(ROTATED_REFRESH_TOKEN);
            }
            Json(body).into_response()
        }
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn web_api(
    State(backend): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches("/v1").to_string();
    let mut backend = backend.lock().unwrap();
    backend.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let known = [ACCESS_TOKEN, REFRESHED_TOKEN]
        .iter()
        .any(|t| bearer == format!("Bearer {}", t));
    if !known {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": {"status": 401, "message": "Invalid access token"}})),
        )
            .into_response();
    }

    if let Some((status, body)) = backend.failures.get_mut(&path).and_then(VecDeque::pop_front) {
        return (status, body).into_response();
    }

    let offset = query.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let limit = query.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);

    match (method.as_str(), path.as_str()) {
        ("GET", "/me") => Json(json!({
            "id": "una",
            "display_name": "Una",
            "email": "una@example.com",
            "images": []
        }))
        .into_response(),
        ("GET", "/me/tracks") => paged(
            vec![
                json!({"track": {"id": "t1"}}),
                json!({"track": {"id": "t2"}}),
                json!({"track": {"id": null}}),
            ],
            offset,
            limit,
        ),
        ("GET", "/me/playlists") => paged(
            vec![
                json!({"id": "pl1", "name": "Road Trip", "description": "Long drives", "public": true}),
                Value::Null,
            ],
            offset,
            limit,
        ),
        ("GET", "/playlists/pl1/tracks") => paged(
            vec![
                json!({"track": {"id": "t2"}}),
                json!({"track": {"id": "t3"}}),
                json!({"track": null}),
            ],
            offset,
            limit,
        ),
        ("GET", "/me/albums") => paged(
            vec![json!({"album": {"id": "al1", "name": "Blue"}})],
            offset,
            limit,
        ),
        ("GET", "/albums/al1/tracks") => paged(
            vec![json!({"id": "t4"}), json!({"id": "t1"})],
            offset,
            limit,
        ),
        ("GET", "/me/following") => followed(query.get("after"), limit),
        ("POST", "/me/playlists") => {
            backend.created += 1;
            let id = format!("created-{}", backend.created);
            let name = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v["name"].as_str().map(str::to_string))
                .unwrap_or_default();
            (
                StatusCode::CREATED,
                Json(json!({
                    "id": id,
                    "name": name,
                    "external_urls": {"spotify": format!("https://open.spotify.com/playlist/{}", id)}
                })),
            )
                .into_response()
        }
        ("POST", p) if p.starts_with("/playlists/") && p.ends_with("/tracks") => {
            (StatusCode::CREATED, Json(json!({"snapshot_id": "snap"}))).into_response()
        }
        ("PUT", "/me/tracks") | ("PUT", "/me/albums") => StatusCode::OK.into_response(),
        ("PUT", "/me/following") => StatusCode::NO_CONTENT.into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": {"status": 404, "message": "Service not found"}})),
        )
            .into_response(),
    }
}

fn paged(items: Vec<Value>, offset: usize, limit: usize) -> Response {
    let total = items.len();
    let page: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
    let next = (offset + limit < total)
        .then(|| format!("https://api.spotify.com/v1/page?offset={}", offset + limit));

    Json(json!({
        "items": page,
        "total": total,
        "limit": limit,
        "offset": offset,
        "next": next
    }))
    .into_response()
}

fn followed(after: Option<&String>, limit: usize) -> Response {
    let all = ["ar1", "ar2", "ar3"];
    let start = after
        .and_then(|a| all.iter().position(|id| id == a))
        .map_or(0, |i| i + 1);
    let page: Vec<&str> = all.iter().skip(start).take(limit).copied().collect();
    let more = start + page.len() < all.len();
    let cursor = if more { page.last().copied() } else { None };

    Json(json!({
        "artists": {
            "items": page
                .iter()
                .map(|id| json!({"id": id, "name": id.to_uppercase()}))
                .collect::<Vec<_>>(),
            "next": more.then_some("https://api.spotify.com/v1/me/following?type=artist"),
            "cursors": {"after": cursor},
            "total": all.len()
        }
    }))
    .into_response()
}
