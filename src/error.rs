use crate::protocol::ServerMessage;

pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while applying a client command to the session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("No active poll")]
    NoActivePoll,

    #[error("Only the teacher can {0}")]
    Unauthorized(&'static str),
}

impl SessionError {
    /// Stable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::InvalidPayload(_) => "INVALID_PAYLOAD",
            SessionError::UnknownParticipant(_) => "UNKNOWN_PARTICIPANT",
            SessionError::NoActivePoll => "NO_ACTIVE_POLL",
            SessionError::Unauthorized(_) => "UNAUTHORIZED",
        }
    }
}

impl From<&SessionError> for ServerMessage {
    fn from(e: &SessionError) -> Self {
        ServerMessage::Error {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::InvalidPayload(e.to_string())
    }
}
