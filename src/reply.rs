//! Query results and lenient decoders over them.
//!
//! Queries never return `Err`: the outcome is in [`Reply::state`] and the
//! raw values in [`Reply::data`]. The decoders below never fail either;
//! missing or short data decodes to `""`, `0`, `None` or an empty
//! collection.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::codec::{bytes_to_string, decode_score};
use crate::error::Error;

/// Outcome of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplyState {
    Ok,
    /// The key or member is absent.
    NotFound,
    /// The hashmap or sorted set does not exist.
    BucketNotFound,
    /// IO, corruption or lock timeout.
    Error,
    /// Malformed call arguments.
    ClientError,
}

impl ReplyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyState::Ok => "ok",
            ReplyState::NotFound => "not_found",
            ReplyState::BucketNotFound => "bucket_not_found",
            ReplyState::Error => "error",
            ReplyState::ClientError => "client_error",
        }
    }
}

impl fmt::Display for ReplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a query: a status plus raw byte values.
///
/// How `data` is laid out depends on the query: one value for `hget` and
/// `zget`, alternating key/value for `hmget` and hash scans, alternating
/// member/score for `zmget` and sorted-set scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub state: ReplyState,
    pub data: Vec<Vec<u8>>,
}

/// A key/value (or member/score) pair taken from a reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Reply {
    pub fn ok(data: Vec<Vec<u8>>) -> Self {
        Reply {
            state: ReplyState::Ok,
            data,
        }
    }

    /// Reply for a query that failed with `err`.
    pub fn from_error(err: Error) -> Self {
        let state = err.reply_state();
        if state == ReplyState::Error {
            warn!(error = %err, "query failed");
        }
        Reply {
            state,
            data: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.state == ReplyState::Ok
    }

    /// Number of raw values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// First value as text.
    pub fn string(&self) -> String {
        self.data.first().map(|v| bytes_to_string(v)).unwrap_or_default()
    }

    /// First value as a big-endian `u64`.
    pub fn uint(&self) -> u64 {
        self.data.first().map(|v| bytes_to_uint(v)).unwrap_or(0)
    }

    /// First value as a big-endian `u64`, reinterpreted as `i64`.
    pub fn int(&self) -> i64 {
        self.uint() as i64
    }

    /// First value decoded as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Option<T> {
        self.data.first().and_then(|v| serde_json::from_slice(v).ok())
    }

    /// Values paired up in order. A trailing unpaired value is ignored.
    pub fn list(&self) -> Vec<Entry> {
        self.data
            .chunks_exact(2)
            .map(|pair| Entry {
                key: pair[0].clone(),
                value: pair[1].clone(),
            })
            .collect()
    }

    /// Values paired up into a map keyed by text. Later duplicates win.
    pub fn dict(&self) -> HashMap<String, Vec<u8>> {
        self.data
            .chunks_exact(2)
            .map(|pair| (bytes_to_string(&pair[0]), pair[1].clone()))
            .collect()
    }
}

impl Entry {
    pub fn key_string(&self) -> String {
        bytes_to_string(&self.key)
    }

    pub fn value_string(&self) -> String {
        bytes_to_string(&self.value)
    }

    /// Value as a big-endian `u64`: the score for sorted-set entries.
    pub fn value_uint(&self) -> u64 {
        bytes_to_uint(&self.value)
    }

    pub fn value_int(&self) -> i64 {
        self.value_uint() as i64
    }

    pub fn value_json<T: DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_slice(&self.value).ok()
    }
}

fn bytes_to_uint(bytes: &[u8]) -> u64 {
    decode_score(bytes).unwrap_or(0)
}
