use core::fmt;
use std::error::Error;

use derive_more::Display;

/// Coarse classification of election failures. Vote collection branches on it:
/// `Canceled` retreats the candidate, `MemberUnavailable` counts as a negative vote.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    MemberUnavailable,
    Canceled,
    InvalidOperation,
    Storage,
    Internal,
}

#[derive(Debug, Clone)]
pub struct RaftError {
    kind: ErrorKind,
    text: String,
    cause: String,
}

pub type Result<T> = std::result::Result<T, RaftError>;

pub fn new_err<T>(kind: ErrorKind, text: String, cause: String) -> Result<T> {
    Err(RaftError::new(kind, text, cause))
}

impl RaftError {
    pub fn new(kind: ErrorKind, text: String, cause: String) -> RaftError {
        RaftError { kind, text, cause }
    }

    pub fn member_unavailable(endpoint: &str, cause: String) -> RaftError {
        RaftError::new(
            ErrorKind::MemberUnavailable,
            format!("Cluster member {} is unavailable", endpoint),
            cause,
        )
    }

    pub fn canceled(text: &str) -> RaftError {
        RaftError::new(ErrorKind::Canceled, text.to_string(), String::new())
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_canceled(&self) -> bool {
        self.kind == ErrorKind::Canceled
    }
}

impl fmt::Display for RaftError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cause_word = {
            if !self.cause.is_empty() {
                " Cause: ".to_string()
            } else {
                String::new()
            }
        };
        write!(f, "{} ({}).{}{}", self.text, self.kind, cause_word, self.cause)
    }
}

impl Error for RaftError {}
