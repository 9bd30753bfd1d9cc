use thiserror::Error;

/// Failure inside the remote gateway. Never escapes a public gateway function.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error(
        "remote returned {status}: {}",
        .message.as_deref().unwrap_or("no error message")
    )]
    Status { status: u16, message: Option<String> },

    #[error("undecodable response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Login or registration rejected. The message is shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
}

impl AuthFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("session storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage format: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a mutation never left the client.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    #[error("name must not be empty")]
    EmptyName,

    #[error("no active session")]
    NotPermitted,

    #[error("no such counter")]
    UnknownCounter,

    #[error("counter has no remote id")]
    NotPersisted,

    #[error("count already at its bound")]
    AtBound,

    #[error("no counter is being edited")]
    NothingToSave,

    #[error("another request is still loading")]
    Busy,
}

/// How a single optimistic mutation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Committed,
    RolledBack,
    Rejected(Rejection),
    /// The session changed while the remote call was in flight; the result was dropped.
    Stale,
}

impl MutationOutcome {
    pub fn is_committed(self) -> bool {
        matches!(self, MutationOutcome::Committed)
    }
}
