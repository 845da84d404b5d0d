use std::fmt;
use std::io;

use crate::reply::ReplyState;

/// Unified error type for the store.
#[derive(Debug)]
pub enum Error {
    /// IO error from disk operations.
    Io(io::Error),
    /// Data corruption detected (CRC mismatch, bad format, short score, etc).
    Corruption(String),
    /// Key not found.
    NotFound,
    /// The bucket a read was addressed to does not exist.
    BucketNotFound,
    /// An increment would leave the `[0, u64::MAX]` range.
    Overflow,
    /// Malformed call arguments (odd-length pair list, empty key, ...).
    InvalidArgument(String),
    /// The store or a transaction could not be acquired in time.
    Timeout,
}

impl Error {
    /// Status a query reports when it fails with this error.
    pub fn reply_state(&self) -> ReplyState {
        match self {
            Error::NotFound => ReplyState::NotFound,
            Error::BucketNotFound => ReplyState::BucketNotFound,
            Error::InvalidArgument(_) => ReplyState::ClientError,
            Error::Io(_) | Error::Corruption(_) | Error::Overflow | Error::Timeout => {
                ReplyState::Error
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {e}"),
            Error::Corruption(msg) => write!(f, "Corruption: {msg}"),
            Error::NotFound => write!(f, "Not found"),
            Error::BucketNotFound => write!(f, "Bucket not found"),
            Error::Overflow => write!(f, "Increment leaves the u64 range"),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            Error::Timeout => write!(f, "Timed out waiting for lock"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
