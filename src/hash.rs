//! Hashmaps: `field -> value` pairs in one bucket named `30 ‖ name`.

use crate::codec::{bucket_name, check_pairs, decode_score, encode_score};
use crate::db::DB;
use crate::error::{Error, Result};
use crate::iterator::StorageIterator;
use crate::reply::Reply;
use crate::types::{BucketName, HASH_PREFIX};

fn hash_bucket(name: &str) -> BucketName {
    bucket_name(HASH_PREFIX, name)
}

impl DB {
    /// Set `key` to `value` in hashmap `name`, creating the hashmap if needed.
    pub fn hset(&self, name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let bucket = hash_bucket(name);
        self.update(|tx| {
            tx.create_bucket_if_not_exists(&bucket)?;
            tx.put(&bucket, key, value)
        })
    }

    /// Set several fields in one transaction. `kvs` alternates key, value.
    ///
    /// An empty or odd-length `kvs` is rejected before anything is written.
    pub fn hmset(&self, name: &str, kvs: &[&[u8]]) -> Result<()> {
        check_pairs(kvs)?;
        let bucket = hash_bucket(name);
        self.update(|tx| {
            tx.create_bucket_if_not_exists(&bucket)?;
            for pair in kvs.chunks_exact(2) {
                tx.put(&bucket, pair[0], pair[1])?;
            }
            Ok(())
        })
    }

    /// Add `step` to the counter stored at `key` and return the new value.
    ///
    /// Counters are 8-byte big-endian `u64`s; an absent key counts as 0.
    /// Fails with [`Error::Overflow`] and writes nothing if the result would
    /// leave `[0, u64::MAX]`.
    pub fn hincr(&self, name: &str, key: &[u8], step: i64) -> Result<u64> {
        let bucket = hash_bucket(name);
        self.update(|tx| {
            tx.create_bucket_if_not_exists(&bucket)?;
            let current = tx
                .bucket(&bucket)
                .and_then(|b| b.get(key))
                .map_or(0, |v| decode_score(v).unwrap_or(0));
            let next = current.checked_add_signed(step).ok_or(Error::Overflow)?;
            tx.put(&bucket, key, &encode_score(next))?;
            Ok(next)
        })
    }

    /// Remove one field. Missing hashmap or key is not an error.
    pub fn hdel(&self, name: &str, key: &[u8]) -> Result<()> {
        let bucket = hash_bucket(name);
        self.update(|tx| {
            if tx.bucket(&bucket).is_some() {
                tx.delete(&bucket, key)?;
            }
            Ok(())
        })
    }

    /// Drop the whole hashmap. Missing hashmap is not an error.
    pub fn hdel_bucket(&self, name: &str) -> Result<()> {
        let bucket = hash_bucket(name);
        self.update(|tx| tx.delete_bucket(&bucket).map(|_| ()))
    }

    /// Value of one field.
    pub fn hget(&self, name: &str, key: &[u8]) -> Reply {
        let bucket = hash_bucket(name);
        self.view(|tx| {
            let fields = tx.bucket(&bucket).ok_or(Error::BucketNotFound)?;
            let value = fields.get(key).ok_or(Error::NotFound)?;
            Ok(Reply::ok(vec![value.to_vec()]))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Alternating key, value for every requested key that exists.
    pub fn hmget(&self, name: &str, keys: &[&[u8]]) -> Reply {
        let bucket = hash_bucket(name);
        self.view(|tx| {
            let fields = tx.bucket(&bucket).ok_or(Error::BucketNotFound)?;
            let mut data = Vec::new();
            for key in keys {
                if let Some(value) = fields.get(key) {
                    data.push(key.to_vec());
                    data.push(value.to_vec());
                }
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Up to `limit` pairs with keys strictly greater than `key_start`, ascending.
    ///
    /// `key_start` itself is never returned; pass the last key of the previous
    /// page to continue from there.
    pub fn hscan(&self, name: &str, key_start: &[u8], limit: usize) -> Reply {
        let bucket = hash_bucket(name);
        self.view(|tx| {
            let fields = tx.bucket(&bucket).ok_or(Error::BucketNotFound)?;
            let mut cursor = fields.cursor_after(key_start)?;
            let mut data = Vec::new();
            let mut n = 0;
            while n < limit && cursor.is_valid() {
                data.push(cursor.key().to_vec());
                data.push(cursor.value().to_vec());
                n += 1;
                cursor.next()?;
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }

    /// Up to `limit` pairs with keys strictly less than `key_start`, descending.
    /// An empty `key_start` starts from the last key.
    pub fn hrscan(&self, name: &str, key_start: &[u8], limit: usize) -> Reply {
        let bucket = hash_bucket(name);
        self.view(|tx| {
            let fields = tx.bucket(&bucket).ok_or(Error::BucketNotFound)?;
            let mut cursor = if key_start.is_empty() {
                let mut cursor = fields.cursor();
                cursor.seek_to_last()?;
                cursor
            } else {
                fields.cursor_before(key_start)?
            };
            let mut data = Vec::new();
            let mut n = 0;
            while n < limit && cursor.is_valid() {
                data.push(cursor.key().to_vec());
                data.push(cursor.value().to_vec());
                n += 1;
                cursor.prev()?;
            }
            Ok(Reply::ok(data))
        })
        .unwrap_or_else(Reply::from_error)
    }
}
