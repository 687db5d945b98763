//! Spotify library transfer service.
//!
//! Moves a Spotify library from one account to another through a small local
//! web app: the source library is read into a snapshot, the browser keeps it,
//! and the snapshot is replayed into the target account. It can also pool a
//! library into a single new playlist.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the browser app
//! - `config` - Configuration from environment variables and `.env`
//! - `management` - Credential storage in signed cookies
//! - `server` - Router and HTTP server
//! - `spotify` - Spotify Web API client and login flow
//! - `transfer` - Collection, replication and progress reporting
//! - `types` - Domain, request and wire types
//! - `utils` - Login state encoding and small helpers
//!
//! # Example
//!
//! ```ignore
//! use spotmover::{config, server};
//!
//! #[tokio::main]
//! async fn main() -> spotmover::Res<()> {
//!     config::load_env().await?;
//!     let config = config::Config::from_env()?;
//!     server::start_api_server(config, false).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod management;
pub mod server;
pub mod spotify;
pub mod transfer;
pub mod types;
pub mod utils;

/// Boxed-error result for entry points where any failure just ends the
/// program with a message.
///
/// Library code returns typed errors (`ApiError`, `TransferError`,
/// `ConfigError`); they all convert into this with `?`.
///
/// # Example
///
/// ```
/// async fn serve() -> Res<()> {
///     let config = Config::from_env()?;
///     server::start_api_server(config, false).await
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

// Console logging. One line per event, tagged with a colored marker:
// `[o]` info, `[✓]` success, `[!]` warning (yellow) or fatal error (red).

/// Progress and status lines.
///
/// ```ignore
/// info!("Fetched {} liked songs", count);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Completed steps.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints the message and exits with status 1. Startup only; request
/// handlers must never call this.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Recoverable problems: retries, skipped categories, refused logins.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
