//! Hub adapter setup errors.

/// The HTTP client could not be built.
#[derive(Debug, thiserror::Error)]
pub enum HubSetupError {
    #[error("invalid hub token")]
    InvalidToken(#[source] reqwest::header::InvalidHeaderValue),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),
}
