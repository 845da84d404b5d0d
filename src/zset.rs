//! Sorted sets: members ordered by a `u64` score.
//!
//! The store has no secondary indexes, so each sorted set is kept in two
//! buckets that every write updates together:
//!
//! ```text
//! zkey:   31 ‖ name    score(8B BE) ‖ member -> ""       ordered by (score, member)
//! zscore: 29 ‖ name    member              -> score(8B BE)
//! ```
//!
//! Invariant: a member has a `zscore` entry with score `s` exactly when
//! `s ‖ member` is in `zkey`, and `zkey` holds no other entry for it.
//! `zscore` is how a write finds the stale `zkey` entry to remove.

use crate::codec::{
    SCORE_LEN, SCORE_MAX, SCORE_MIN, bucket_name, check_pairs, concat, decode_score, encode_score,
};
use crate::db::{DB, WriteTx};
use crate::error::{Error, Result};
use crate::iterator::StorageIterator;
use crate::reply::Reply;
use crate::types::{BucketName, ZSET_KEY_PREFIX, ZSET_SCORE_PREFIX};

/// Member bound used by `zrscan` when no start member is given.
const MEMBER_SENTINEL: &[u8] = &[0xFF];

/// The two buckets backing one sorted set.
struct ZsetBuckets {
    /// `score ‖ member -> ""`
    index: BucketName,
    /// `member -> score`
    scores: BucketName,
}

impl ZsetBuckets {
    fn new(name: &str) -> Self {
        ZsetBuckets {
            index: bucket_name(ZSET_KEY_PREFIX, name),
            scores: bucket_name(ZSET_SCORE_PREFIX, name),
        }
    }

    fn create(&self, tx: &mut WriteTx<'_>) -> Result<()> {
        tx.create_bucket_if_not_exists(&self.index)?;
        tx.create_bucket_if_not_exists(&self.scores)
    }

    fn current_score(&self, tx: &WriteTx<'_>, member: &[u8]) -> Option<Vec<u8>> {
        tx.bucket(&self.scores)
            .and_then(|b| b.get(member))
            .map(<[u8]>::to_vec)
    }

    /// Move `member` to `score` (8 bytes), keeping both buckets in step.
    /// Leaves everything untouched when the score is unchanged.
    fn index_member(&self, tx: &mut WriteTx<'_>, member: &[u8], score: &[u8]) -> Result<()> {
        let old = self.current_score(tx, member);
        if old.as_deref() == Some(score) {
            return Ok(());
        }

        tx.put(&self.index, &concat(&[score, member]), &[])?;
        tx.put(&self.scores, member, score)?;
        if let Some(old) = old {
            tx.delete(&self.index, &concat(&[&old, member]))?;
        }
        Ok(())
    }
}

/// Split a `zkey` entry into `(member, score bytes)`.
fn split_index_key(key: &[u8]) -> Result<(&[u8], &[u8])> {
    if key.len() < SCORE_LEN {
        return Err(Error::Corruption(format!(
            "sorted-set index key of {} bytes",
            key.len()
        )));
    }
    let (score, member) = key.split_at(SCORE_LEN);
    Ok((member, score))
}

impl DB {
    /// Set `member`'s score, creating the sorted set if needed.
    pub fn zset(&self, name: &str, member: &[u8], score: u64) -> Result<()> {
        let buckets = ZsetBuckets::new(name);
        self.update(|tx| {
            buckets.create(tx)?;
            buckets.index_member(tx, member, &encode_score(score))
        })
    }

    /// Set several scores in one transaction. `kvs` alternates member and
    /// 8-byte big-endian score.
    ///
    /// Rejected before anything is written if `kvs` is empty, odd-length, or
    /// holds a score that is not exactly 8 bytes.
    pub fn zmset(&self, name: &str, kvs: &[&[u8]]) -> Result<()> {
        check_pairs(kvs)?;
        if let Some(bad) = kvs.chunks_exact(2).find(|pair| pair[1].len() != SCORE_LEN) {
            return Err(Error::InvalidArgument(format!(
                "score must be {SCORE_LEN} bytes, got {}",
                bad[1].len()
            )));
        }

        let buckets = ZsetBuckets::new(name);
        self.update(|tx| {
            buckets.create(tx)?;
            for pair in kvs.chunks_exact(2) {
                buckets.index_member(tx, pair[0], pair[1])?;
            }
            Ok(())
        })
    }

    /// Add `step` to `member`'s score (0 if absent) and return the new score.
    ///
    /// Fails with [`Error::Overflow`] and writes nothing if the result would
    /// leave `[0, u64::MAX]`.
    pub fn zincr(&self, name: &str, member: &[u8], step: i64) -> Result<u64> {
        let buckets = ZsetBuckets::new(name);
        self.update(|tx| {
            buckets.create(tx)?;
            let current = buckets
                .current_score(tx, member)
                .map_or(0, |v| decode_score(&v).unwrap_or(0));
            let next = current.checked_add_signed(step).ok_or(Error::Overflow)?;
            buckets.index_member(tx, member, &encode_score(next))?;
            Ok(next)
        })
    }

    /// Remove `member` from both buckets. Missing member or set is not an error.
    pub fn zdel(&self, name: &str, member: &[u8]) -> Result<()> {
        let buckets = ZsetBuckets::new(name);
        self.update(|tx| {
            if tx.bucket(&buckets.index).is_none() {
                return Ok(());
            }
            let Some(old) = buckets.current_score(tx, member) else {
                return Ok(());
            };
            tx.delete(&buckets.index, &concat(&[&old, member]))?;
            tx.delete(&buckets.scores, member)?;
            Ok(())
        })
    }

    /// Drop the whole sorted set. Missing set is not an error.
    pub fn zdel_bucket(&self, name: &str) -> Result<()> {
        let buckets = ZsetBuckets::new(name);
        self.update(|tx| {
            tx.delete_bucket(&buckets.index)?;
            tx.delete_bucket(&buckets.scores)?;
            Ok(())
        })
    }

    /// Score of one member, as 8 big-endian bytes (see [`Reply::uint`]).
    pub fn zget(&self, name: &str, member: &[u8]) -> Reply {
        let buckets = ZsetBuckets::new(name);
        self.view(|tx| {
            let scores = tx.bucket(&buckets.scores).ok_or(Error::BucketNotFound)?;
            let score = scores.get(member).ok_or(Error::NotFound)?;
            Ok(Reply::ok(vec![score.to_vec()]))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Alternating member, score for every requested member that exists.
    pub fn zmget(&self, name: &str, members: &[&[u8]]) -> Reply {
        let buckets = ZsetBuckets::new(name);
        self.view(|tx| {
            let scores = tx.bucket(&buckets.scores).ok_or(Error::BucketNotFound)?;
            let mut data = Vec::new();
            for member in members {
                if let Some(score) = scores.get(member) {
                    data.push(member.to_vec());
                    data.push(score.to_vec());
                }
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Up to `limit` members in ascending `(score, member)` order, strictly
    /// after `score_start ‖ member_start`. `score_start` defaults to 0.
    ///
    /// Data alternates member, score (8 bytes).
    pub fn zscan(
        &self,
        name: &str,
        member_start: &[u8],
        score_start: Option<u64>,
        limit: usize,
    ) -> Reply {
        let buckets = ZsetBuckets::new(name);
        let start = concat(&[
            &encode_score(score_start.unwrap_or(SCORE_MIN)),
            member_start,
        ]);
        self.view(|tx| {
            let index = tx.bucket(&buckets.index).ok_or(Error::BucketNotFound)?;
            let mut cursor = index.cursor_after(&start)?;
            let mut data = Vec::new();
            let mut n = 0;
            while n < limit && cursor.is_valid() {
                let (member, score) = split_index_key(cursor.key())?;
                data.push(member.to_vec());
                data.push(score.to_vec());
                n += 1;
                cursor.next()?;
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Up to `limit` members in descending `(score, member)` order, strictly
    /// before `score_start ‖ member_start`.
    ///
    /// `score_start` defaults to `u64::MAX` and an empty `member_start` to the
    /// single byte `0xFF`, so with no bounds the scan starts at the end of
    /// the set. A member of `u64::MAX` score that itself starts with `0xFF`
    /// sorts after that bound and is skipped.
    pub fn zrscan(
        &self,
        name: &str,
        member_start: &[u8],
        score_start: Option<u64>,
        limit: usize,
    ) -> Reply {
        let buckets = ZsetBuckets::new(name);
        let member_start = if member_start.is_empty() {
            MEMBER_SENTINEL
        } else {
            member_start
        };
        let start = concat(&[
            &encode_score(score_start.unwrap_or(SCORE_MAX)),
            member_start,
        ]);
        self.view(|tx| {
            let index = tx.bucket(&buckets.index).ok_or(Error::BucketNotFound)?;
            let mut cursor = index.cursor_before(&start)?;
            let mut data = Vec::new();
            let mut n = 0;
            while n < limit && cursor.is_valid() {
                let (member, score) = split_index_key(cursor.key())?;
                data.push(member.to_vec());
                data.push(score.to_vec());
                n += 1;
                cursor.prev()?;
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }
}
