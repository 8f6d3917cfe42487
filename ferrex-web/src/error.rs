//! Error types for the web bootstrap layer
//!
//! One enum per concern so callers can tell an auth problem apart from a
//! transport problem. Only [`crate::payload::SsrFailure`] ever crosses the
//! server/client boundary; the types here stay in-process.

use thiserror::Error;

use crate::descriptor::ResourcePath;

/// A response body did not match the shape its descriptor expects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response does not match {expected}: {message}")]
pub struct ParseError {
    pub expected: String,
    pub message: String,
}

impl ParseError {
    pub fn new(expected: impl Into<String>, message: impl ToString) -> Self {
        Self {
            expected: expected.into(),
            message: message.to_string(),
        }
    }
}

/// Batched fetch failures. Any one of these fails the whole batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request for {path} failed")]
    Transport {
        path: ResourcePath,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {path} failed with status {status}: {body}")]
    Status {
        path: ResourcePath,
        status: u16,
        body: String,
    },

    #[error("unexpected response for {path}")]
    Parse {
        path: ResourcePath,
        #[source]
        source: ParseError,
    },
}

/// Raised by page and layout descriptor functions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("missing route parameter: {0}")]
    MissingParam(String),

    #[error("invalid route parameter {name}: {value}")]
    InvalidParam { name: String, value: String },

    #[error("descriptor error: {0}")]
    Other(String),
}

/// Access token resolution failures
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("access token expired and no refresh token is stored")]
    RefreshTokenMissing,

    #[error("refresh rejected with status {0}")]
    Rejected(u16),

    #[error("invalid refresh URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("refresh request failed")]
    Transport(#[source] reqwest::Error),
}

impl TokenError {
    /// Whether the session itself is gone, as opposed to the refresh
    /// endpoint being unreachable.
    pub fn is_session_expired(&self) -> bool {
        match self {
            Self::RefreshTokenMissing => true,
            Self::Rejected(status) => matches!(status, 400 | 401 | 403),
            Self::InvalidUrl(_) | Self::Transport(_) => false,
        }
    }
}

/// Account store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("unable to determine data directory")]
    NoDataDir,

    #[error("failed to access account storage")]
    Io(#[from] std::io::Error),

    #[error("corrupted account storage")]
    Corrupted(#[from] serde_json::Error),
}

/// Signed cookie failures
#[derive(Debug, Error)]
pub enum CookieError {
    #[error("cookie signing secret must not be empty")]
    EmptySecret,

    #[error("malformed cookie value")]
    Malformed,

    #[error("cookie signature mismatch")]
    Signature,

    #[error("cookie body rejected: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Transportable payload codec failures
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to encode payload")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode payload")]
    Decode(#[source] serde_json::Error),

    #[error("unsupported payload version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("payload script not found in document")]
    MissingScript,
}

/// Failures contained by the SSR boundary
#[derive(Debug, Error)]
pub(crate) enum SsrAbort {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("panic during server-side data fetch: {0}")]
    Panicked(String),
}

/// Client-side navigation failures
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
