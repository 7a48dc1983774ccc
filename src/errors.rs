//! Error types used across the crate
//!
//! [`EventStreamError`] is what the decoder yields, generic over whatever the underlying byte
//! stream fails with. [`Error`] is the classified error every client call resolves to.

use core::{
    fmt::{Display, Formatter},
    str::Utf8Error,
    time::Duration,
};

pub mod api;

#[derive(Debug, PartialEq)]
pub enum EventStreamError<E> {
    /// Something went wrong with the underlying stream
    Transport(E),
    /// The stream had invalid utf8
    Utf8Error(Utf8Error),
}

impl<E> From<Utf8Error> for EventStreamError<E> {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8Error(value)
    }
}

impl<E> Display for EventStreamError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            EventStreamError::Transport(e) => e.fmt(f),
            EventStreamError::Utf8Error(e) => e.fmt(f),
        }
    }
}

impl<E> core::error::Error for EventStreamError<E> where E: core::error::Error {}

/// Failure to get a response out of the network at all
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// Terminal error of a client call
///
/// Transient failures ([`Error::Network`] and retryable [`Error::Http`]) have already been
/// retried by the time one of these reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network failure: {0}")]
    Network(#[from] NetworkError),
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_path_to_error::Error<serde_json::Error>),
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("invalid request target `{target}`: {reason}")]
    InvalidRequestTarget { target: String, reason: String },
    #[error("event stream failed: {0}")]
    Stream(String),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(NetworkError::Transport(value))
    }
}

impl Error {
    pub(crate) fn invalid_target(target: impl Into<String>, reason: impl Display) -> Self {
        Self::InvalidRequestTarget {
            target: target.into(),
            reason: reason.to_string(),
        }
    }

    /// Status code of an [`Error::Http`]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine readable code the service attached to an [`Error::Http`], if any
    pub fn code(&self) -> Option<&str> {
        match self {
            Error::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed: transport failures, 429 and 5xx
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Http { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Network(NetworkError::Timeout(_)) => true,
            Error::Network(NetworkError::Transport(e)) => e.is_timeout(),
            _ => false,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self.status(), Some(400 | 422))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status(), Some(500..=599))
    }
}
