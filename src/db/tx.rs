use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

use crate::bucket::Bucket;
use crate::db::State;
use crate::error::{Error, Result};
use crate::types::{BucketName, Key, Value};
use crate::wal::{MAX_RECORD_SIZE, WALOp, WALRecord};

/// Longest key or bucket name a write transaction accepts.
pub const MAX_KEY_SIZE: usize = 32 * 1024;

/// Longest value a write transaction accepts.
pub const MAX_VALUE_SIZE: usize = (1 << 31) - 2;

/// A read-only view of the store.
///
/// Holds the shared side of the store lock: writers wait until every
/// `ReadTx` is dropped.
pub struct ReadTx<'a> {
    state: RwLockReadGuard<'a, State>,
}

impl<'a> ReadTx<'a> {
    pub(crate) fn new(state: RwLockReadGuard<'a, State>) -> Self {
        ReadTx { state }
    }

    /// Look up a bucket by its full name.
    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        self.state.buckets.get(name)
    }

    /// Names of every bucket, in byte order.
    pub fn bucket_names(&self) -> impl Iterator<Item = &[u8]> {
        self.state.buckets.keys().map(Vec::as_slice)
    }

    /// Sequence number of the last committed write transaction.
    pub fn sequence(&self) -> u64 {
        self.state.sequence
    }
}

/// How to put one change back when a write transaction is abandoned.
enum Undo {
    CreatedBucket(BucketName),
    DroppedBucket(BucketName, Bucket),
    Key {
        bucket: BucketName,
        key: Key,
        old: Option<Value>,
    },
}

/// The single read-write transaction.
///
/// Changes apply to the buckets immediately, so reads inside the
/// transaction see them. Each change also records a WAL op and an undo
/// entry. `commit` appends the ops as one WAL record; `rollback`, a failed
/// append, or dropping the transaction replays the undo entries in reverse.
pub struct WriteTx<'a> {
    state: RwLockWriteGuard<'a, State>,
    ops: Vec<WALOp>,
    undo: Vec<Undo>,
    done: bool,
}

impl<'a> WriteTx<'a> {
    pub(crate) fn new(state: RwLockWriteGuard<'a, State>) -> Self {
        WriteTx {
            state,
            ops: Vec::new(),
            undo: Vec::new(),
            done: false,
        }
    }

    /// Look up a bucket by its full name.
    pub fn bucket(&self, name: &[u8]) -> Option<&Bucket> {
        self.state.buckets.get(name)
    }

    /// Create the bucket unless it already exists.
    pub fn create_bucket_if_not_exists(&mut self, name: &[u8]) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidArgument("bucket name required".into()));
        }
        if name.len() > MAX_KEY_SIZE {
            return Err(Error::InvalidArgument(format!(
                "bucket name of {} bytes exceeds {MAX_KEY_SIZE}",
                name.len()
            )));
        }
        if !self.state.buckets.contains_key(name) {
            self.state.buckets.insert(name.to_vec(), Bucket::new());
            self.ops.push(WALOp::create_bucket(name.to_vec()));
            self.undo.push(Undo::CreatedBucket(name.to_vec()));
        }
        Ok(())
    }

    /// Drop a bucket and everything in it. Returns false if it did not exist.
    pub fn delete_bucket(&mut self, name: &[u8]) -> Result<bool> {
        match self.state.buckets.remove(name) {
            Some(bucket) => {
                self.ops.push(WALOp::delete_bucket(name.to_vec()));
                self.undo.push(Undo::DroppedBucket(name.to_vec(), bucket));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Insert or overwrite `key` in an existing bucket.
    ///
    /// Keys are limited to [`MAX_KEY_SIZE`] bytes and values to
    /// [`MAX_VALUE_SIZE`].
    pub fn put(&mut self, bucket: &[u8], key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidArgument("key required".into()));
        }
        if key.len() > MAX_KEY_SIZE {
            return Err(Error::InvalidArgument(format!(
                "key of {} bytes exceeds {MAX_KEY_SIZE}",
                key.len()
            )));
        }
        if value.len() > MAX_VALUE_SIZE {
            return Err(Error::InvalidArgument(format!(
                "value of {} bytes exceeds {MAX_VALUE_SIZE}",
                value.len()
            )));
        }
        let target = self
            .state
            .buckets
            .get_mut(bucket)
            .ok_or(Error::BucketNotFound)?;
        let old = target.put(key.to_vec(), value.to_vec());

        self.ops
            .push(WALOp::put(bucket.to_vec(), key.to_vec(), value.to_vec()));
        self.undo.push(Undo::Key {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
            old,
        });
        Ok(())
    }

    /// Remove `key` from an existing bucket. Returns false if it was absent.
    pub fn delete(&mut self, bucket: &[u8], key: &[u8]) -> Result<bool> {
        let target = self
            .state
            .buckets
            .get_mut(bucket)
            .ok_or(Error::BucketNotFound)?;
        let Some(old) = target.delete(key) else {
            return Ok(false);
        };

        self.ops.push(WALOp::delete(bucket.to_vec(), key.to_vec()));
        self.undo.push(Undo::Key {
            bucket: bucket.to_vec(),
            key: key.to_vec(),
            old: Some(old),
        });
        Ok(true)
    }

    /// Make the transaction durable. A transaction that changed nothing
    /// writes nothing.
    pub fn commit(mut self) -> Result<()> {
        self.done = true;
        if self.ops.is_empty() {
            return Ok(());
        }

        let sequence = self.state.sequence + 1;
        let record = WALRecord::new(sequence, std::mem::take(&mut self.ops));
        let size = record.encoded_size();
        if size > MAX_RECORD_SIZE {
            warn!(sequence, size, "transaction too large to log, rolling back");
            self.undo_all();
            return Err(Error::InvalidArgument(format!(
                "transaction of {size} bytes exceeds {MAX_RECORD_SIZE}"
            )));
        }
        if let Err(e) = self.state.wal.append(&record) {
            warn!(sequence, error = %e, "WAL append failed, rolling back");
            self.undo_all();
            return Err(e);
        }

        self.state.sequence = sequence;
        self.undo.clear();
        debug!(sequence, ops = record.ops.len(), "committed transaction");
        Ok(())
    }

    /// Abandon every change made by this transaction.
    pub fn rollback(mut self) {
        self.done = true;
        self.undo_all();
    }

    fn undo_all(&mut self) {
        if self.undo.is_empty() {
            return;
        }
        debug!(changes = self.undo.len(), "rolling back transaction");
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::CreatedBucket(name) => {
                    self.state.buckets.remove(&name);
                }
                Undo::DroppedBucket(name, bucket) => {
                    self.state.buckets.insert(name, bucket);
                }
                Undo::Key { bucket, key, old } => {
                    if let Some(target) = self.state.buckets.get_mut(&bucket) {
                        match old {
                            Some(value) => {
                                target.put(key, value);
                            }
                            None => {
                                target.delete(&key);
                            }
                        }
                    }
                }
            }
        }
        self.ops.clear();
    }
}

impl Drop for WriteTx<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.undo_all();
        }
    }
}
