mod credentials;

pub use credentials::CredentialStore;
pub use credentials::{REFRESH_BUFFER_SECS, REFRESH_TOKEN_DAYS};
pub use credentials::{access_name, expires_name, refresh_name};
