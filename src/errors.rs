//! Error types for sos-crise.
//!
//! Uses `thiserror` for library-style error definitions.

use thiserror::Error;

/// Message shown to people whenever a fetch fails, whatever the cause.
pub const USER_MESSAGE: &str = "Não foi possível carregar os dados. Tente novamente mais tarde.";

/// Errors that can occur while talking to the SOS Crise API.
///
/// The variants only matter for logs. Views collapse every one of them
/// into a single "fetch failed" state carrying [`USER_MESSAGE`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP client could not be built
    #[error("failed to initialise HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// HTTP request failed
    #[error("request for {resource} failed: {source}")]
    Http {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    /// API returned an error status
    #[error("API error fetching {resource} (HTTP {status})")]
    Api { resource: String, status: u16 },

    /// JSON parsing failed
    #[error("failed to parse {resource}: {source}")]
    Parse {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// The human-readable message for this failure.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        USER_MESSAGE
    }
}
