use chrono::{DateTime, Local, Utc};

use crate::types::{FlowMode, Role};

const STATE_SEPARATOR: char = '_';
const NO_MODE: &str = "none";

/// What the OAuth `state` parameter carries through the authorize redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub role: Role,
    pub mode: Option<FlowMode>,
    pub issued_at: Option<i64>,
}

/// Encodes `<role>_<mode|none>_<unix millis>`.
pub fn encode_state(role: Role, mode: Option<FlowMode>, issued_at: DateTime<Utc>) -> String {
    format!(
        "{role}{sep}{mode}{sep}{at}",
        role = role,
        mode = mode.map(|m| m.as_str()).unwrap_or(NO_MODE),
        at = issued_at.timestamp_millis(),
        sep = STATE_SEPARATOR
    )
}

/// Parses a state produced by [`encode_state`].
///
/// The role must be known. An unknown or missing mode reads as no mode and
/// an unreadable timestamp as none.
pub fn parse_state(state: &str) -> Result<AuthState, String> {
    let mut parts = state.splitn(3, STATE_SEPARATOR);
    let role = parts.next().unwrap_or_default().parse::<Role>()?;
    let mode = parts
        .next()
        .filter(|m| *m != NO_MODE)
        .and_then(|m| m.parse::<FlowMode>().ok());
    let issued_at = parts.next().and_then(|t| t.parse::<i64>().ok());

    Ok(AuthState {
        role,
        mode,
        issued_at,
    })
}

/// Drops empty ids, keeping order and duplicates.
pub fn valid_ids(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn track_uri(id: &str) -> String {
    format!("spotify:track:{}", id)
}

/// `<title> - <YYYY-MM-DD>`
pub fn playlist_label(title: &str, at: DateTime<Local>) -> String {
    format!("{} - {}", title, at.format("%Y-%m-%d"))
}
