use std::time::Duration;

use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum FeedError {
    /// An error occurred during an HTTP request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The response body was not valid JSON for the expected shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server returned an unexpected or unsuccessful HTTP status code.
    #[error("Unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The requested resource does not exist (HTTP 404).
    #[error("Not found at {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// The provider throttled the request (HTTP 429).
    #[error("Rate limited at {url}")]
    RateLimited {
        /// The URL that returned 429.
        url: String,
    },

    /// The provider failed with a 5xx status.
    #[error("Server error {status} at {url}")]
    ServerError {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// The response envelope carried a non-success status marker.
    #[error("Provider returned status {status}: {message}")]
    Provider {
        /// The status marker the provider sent instead of `OK`.
        status: String,
        /// The provider's error text, if any.
        message: String,
    },

    /// The envelope's `count` disagrees with the number of records it carries.
    #[error("Wrong results count: envelope says {expected}, got {actual}")]
    CountMismatch {
        /// The `count` field of the envelope.
        expected: usize,
        /// The length of the `results` array.
        actual: usize,
    },

    /// The data received from the API was in an unexpected format or was missing a required field.
    #[error("Data format unexpected or missing field: {0}")]
    Data(String),

    /// The consent/crumb bootstrap failed.
    #[error("Session bootstrap failed: {0}")]
    Session(String),

    /// Waiting for rate limiter admission would exceed the allowed wait.
    #[error("rate limiter admission would take longer than {0:?}")]
    AdmissionTimeout(Duration),

    /// No API key was configured for a key-authenticated provider.
    #[error("no API key configured")]
    MissingApiKey,

    /// An invalid date range was provided (start must not be after end).
    #[error("invalid date range: start must not be after end")]
    InvalidDates,
}

/// Coarse classification of a [`FeedError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, connection or HTTP status failures.
    Transport,
    /// The provider answered, but the payload broke the envelope contract.
    Protocol,
    /// The consent/crumb session could not be established.
    Session,
    /// The caller gave up waiting.
    Cancelled,
    /// The request could not be built from the supplied parameters.
    Config,
}

impl FeedError {
    /// Returns the category this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_)
            | Self::Status { .. }
            | Self::NotFound { .. }
            | Self::RateLimited { .. }
            | Self::ServerError { .. } => ErrorKind::Transport,
            Self::Json(_) | Self::Provider { .. } | Self::CountMismatch { .. } | Self::Data(_) => {
                ErrorKind::Protocol
            }
            Self::Session(_) => ErrorKind::Session,
            Self::AdmissionTimeout(_) => ErrorKind::Cancelled,
            Self::Url(_) | Self::MissingApiKey | Self::InvalidDates => ErrorKind::Config,
        }
    }

    /// Maps a non-success HTTP status onto the matching variant.
    pub(crate) fn from_status(code: u16, url: impl Into<String>) -> Self {
        let url = url.into();
        match code {
            404 => Self::NotFound { url },
            429 => Self::RateLimited { url },
            500..=599 => Self::ServerError { status: code, url },
            _ => Self::Status { status: code, url },
        }
    }
}
