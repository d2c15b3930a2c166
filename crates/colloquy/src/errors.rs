use thiserror::Error;

/// A failed outbound fetch, after retries where they apply
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transient fetch error after {attempts} attempt(s): {last}")]
    Transient {
        attempts: u32,
        #[source]
        last: TransientError,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    Invalid(String),
}

/// The cause of a single attempt that is worth retrying
#[derive(Error, Debug)]
pub enum TransientError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}

/// Outcome of one attempt inside a retry loop
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error(transparent)]
    Transient(#[from] TransientError),

    #[error(transparent)]
    Fatal(#[from] FetchError),
}

/// Any failure from the chat or completion capability of a model backend
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModelCallError {
    #[error("Server error: {0}")]
    Server(u16),

    #[error("Request failed: {status}: {body}")]
    Request { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("a conversation needs at least one participant")]
    NoParticipants,
    #[error("more than one participant is named {0}")]
    DuplicateParticipant(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_transient_error_keeps_last_cause() {
        let err = FetchError::Transient {
            attempts: 3,
            last: TransientError::Status {
                status: 503,
                body: "busy".to_string(),
            },
        };

        assert_eq!(
            err.to_string(),
            "transient fetch error after 3 attempt(s): unexpected status 503: busy"
        );
        let source = err.source().expect("source should be set");
        assert_eq!(source.to_string(), "unexpected status 503: busy");
    }

    #[test]
    fn test_attempt_error_conversions() {
        let transient: AttemptError = TransientError::Other("reset".to_string()).into();
        assert!(matches!(transient, AttemptError::Transient(_)));

        let fatal: AttemptError = FetchError::Decode("eof".to_string()).into();
        assert!(matches!(fatal, AttemptError::Fatal(FetchError::Decode(_))));
    }
}
