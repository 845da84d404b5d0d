//! Byte-level helpers shared by the hashmap and sorted-set layers.
//!
//! Scores are `u64` stored as 8 big-endian bytes, so comparing encoded
//! scores byte by byte gives the same order as comparing the numbers.
//! Composite index keys are plain concatenations: the fixed score width is
//! what tells the parts apart.

use crate::error::{Error, Result};
use crate::types::BucketName;

/// Width of an encoded score.
pub const SCORE_LEN: usize = 8;

/// Smallest score. Default lower bound for forward sorted-set scans.
pub const SCORE_MIN: u64 = 0;

/// Largest score. Default upper bound for reverse sorted-set scans.
pub const SCORE_MAX: u64 = u64::MAX;

/// Encode a score as 8 big-endian bytes.
pub fn encode_score(score: u64) -> [u8; SCORE_LEN] {
    score.to_be_bytes()
}

/// Decode the first 8 bytes of `bytes` as a big-endian score.
///
/// Fails with [`Error::Corruption`] when fewer than 8 bytes are given.
pub fn decode_score(bytes: &[u8]) -> Result<u64> {
    let head: [u8; SCORE_LEN] = bytes
        .get(..SCORE_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            Error::Corruption(format!(
                "score needs {SCORE_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
    Ok(u64::from_be_bytes(head))
}

/// Concatenate byte slices in order, without delimiters.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let total = parts.iter().map(|p| p.len()).sum();
    let mut out = Vec::with_capacity(total);
    for part in parts {
        out.extend_from_slice(part);
    }
    out
}

/// Name of the bucket holding structure `name` of family `tag`.
pub fn bucket_name(tag: u8, name: &str) -> BucketName {
    concat(&[&[tag], name.as_bytes()])
}

/// Parse a decimal digit string into an encoded score.
///
/// `"123456"` -> `123456u64` -> 8 big-endian bytes.
pub fn parse_score(digits: &str) -> Result<[u8; SCORE_LEN]> {
    digits
        .parse::<u64>()
        .map(encode_score)
        .map_err(|e| Error::InvalidArgument(format!("bad score {digits:?}: {e}")))
}

/// Parse a decimal digit string, yielding 0 on anything unparsable.
pub fn digits_to_u64(digits: &str) -> u64 {
    digits.parse().unwrap_or(0)
}

/// Render an encoded score as decimal digits. Short input renders as `"0"`.
pub fn score_to_digits(bytes: &[u8]) -> String {
    decode_score(bytes).unwrap_or(0).to_string()
}

/// Check a flat `k1, v1, k2, v2, ...` argument list.
pub fn check_pairs(args: &[&[u8]]) -> Result<()> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "expected a non-empty even number of arguments, got {}",
            args.len()
        )));
    }
    Ok(())
}

/// Lossy UTF-8 view of raw bytes.
pub fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
