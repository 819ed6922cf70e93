use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("appointment range must be non-empty and end by year 9999 (start `{start}`, end `{end}`)")]
    InvalidTimeRange { start: String, end: String },
    #[error("unparseable timestamp `{0}`")]
    UnparseableTimestamp(String),
}

/// Failures that escape the tool-call envelope. Everything else is answered with a spoken
/// phrase and HTTP 200.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn bad_request(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into(), correlation_id: correlation_id.into() }
    }

    pub fn internal(message: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), correlation_id: correlation_id.into() }
    }

    /// Text placed in the `result` field; the voice agent may read it aloud.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "Missing call_id or function name",
            Self::Internal { .. } => "I'm having a moment, let me continue.",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::Internal { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}
