//! The embedded store: named ordered buckets, one writer or many readers,
//! and a write-ahead log that makes each committed write transaction
//! durable and atomic.

mod lock;
pub mod tx;

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::bucket::Bucket;
use crate::error::{Error, Result};
use crate::iterator::StorageIterator;
use crate::types::BucketName;
use crate::wal::reader::WALReader;
use crate::wal::writer::WALWriter;
use crate::wal::{MAX_RECORD_SIZE, RecordType, SyncPolicy, WALOp, WALRecord};

use lock::FileLock;
pub use tx::{MAX_KEY_SIZE, MAX_VALUE_SIZE, ReadTx, WriteTx};

/// Store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Longest wait for the lock file on open, and for the transaction lock
    /// on every call.
    pub timeout: Duration,
    /// When committed transactions are fsync'd.
    pub sync_policy: SyncPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            timeout: Duration::from_secs(1),
            sync_policy: SyncPolicy::EveryWrite,
        }
    }
}

impl Options {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sync_policy(mut self, sync_policy: SyncPolicy) -> Self {
        self.sync_policy = sync_policy;
        self
    }
}

/// Point-in-time counters, see [`DB::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub buckets: usize,
    pub keys: usize,
    /// Bytes held by keys and values across all buckets.
    pub size_bytes: usize,
    /// Sequence number of the last committed write transaction.
    pub sequence: u64,
    /// Current length of the log file.
    pub wal_bytes: u64,
}

/// Everything the store lock protects.
pub(crate) struct State {
    pub(crate) buckets: BTreeMap<BucketName, Bucket>,
    pub(crate) wal: WALWriter,
    pub(crate) sequence: u64,
}

/// Handle to an open store. Safe to share between threads.
pub struct DB {
    path: PathBuf,
    options: Options,
    state: RwLock<State>,
    _lock: FileLock,
}

impl DB {
    /// Open or create the store at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, Options::default())
    }

    /// Open or create the store at `path`.
    ///
    /// Waits up to `options.timeout` for the lock file, then replays the
    /// log. A torn record at the end of the log is discarded.
    pub fn open_with(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock = FileLock::acquire(&with_suffix(&path, ".lock"), options.timeout)?;

        let (buckets, sequence) = recover(&path)?;
        let wal = WALWriter::new(&path, options.sync_policy)?;
        info!(
            path = %path.display(),
            buckets = buckets.len(),
            sequence,
            "opened store"
        );

        Ok(DB {
            path,
            options,
            state: RwLock::new(State {
                buckets,
                wal,
                sequence,
            }),
            _lock: lock,
        })
    }

    /// Flush the log and release the store.
    pub fn close(self) -> Result<()> {
        let DB {
            path, state, _lock, ..
        } = self;
        let mut state = state.into_inner();
        state.wal.sync()?;
        info!(path = %path.display(), sequence = state.sequence, "closed store");
        Ok(())
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Start a read-only transaction.
    pub fn begin_read(&self) -> Result<ReadTx<'_>> {
        let state = self
            .state
            .try_read_for(self.options.timeout)
            .ok_or(Error::Timeout)?;
        Ok(ReadTx::new(state))
    }

    /// Start the read-write transaction. Only one exists at a time.
    pub fn begin_write(&self) -> Result<WriteTx<'_>> {
        let state = self
            .state
            .try_write_for(self.options.timeout)
            .ok_or(Error::Timeout)?;
        Ok(WriteTx::new(state))
    }

    /// Run `f` inside a read-only transaction.
    pub fn view<T>(&self, f: impl FnOnce(&ReadTx<'_>) -> Result<T>) -> Result<T> {
        let tx = self.begin_read()?;
        f(&tx)
    }

    /// Run `f` inside a read-write transaction. Commits if `f` returns
    /// `Ok`, rolls back every change if it returns `Err`.
    pub fn update<T>(&self, f: impl FnOnce(&mut WriteTx<'_>) -> Result<T>) -> Result<T> {
        let mut tx = self.begin_write()?;
        match f(&mut tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    pub fn stats(&self) -> Result<Stats> {
        let state = self
            .state
            .try_read_for(self.options.timeout)
            .ok_or(Error::Timeout)?;
        Ok(Stats {
            buckets: state.buckets.len(),
            keys: state.buckets.values().map(Bucket::len).sum(),
            size_bytes: state.buckets.values().map(Bucket::size).sum(),
            sequence: state.sequence,
            wal_bytes: state.wal.offset(),
        })
    }

    /// Rewrite the log as a snapshot of the live buckets.
    ///
    /// Each bucket becomes one record (several if it would not fit in
    /// [`MAX_RECORD_SIZE`]), all carrying the current sequence number. A store
    /// with no buckets gets a single empty record so the sequence survives.
    ///
    /// The snapshot is written and fsync'd beside the log, then renamed over
    /// it and the directory is fsync'd, so a crash leaves either the old log
    /// or the new one. The snapshot writer's handle follows the rename and
    /// becomes the active log.
    pub fn compact(&self) -> Result<()> {
        let mut state = self
            .state
            .try_write_for(self.options.timeout)
            .ok_or(Error::Timeout)?;
        let before = state.wal.offset();
        let sequence = state.sequence;

        let tmp = with_suffix(&self.path, ".compact");
        if tmp.exists() {
            fs::remove_file(&tmp)?;
        }

        let mut writer = WALWriter::new(&tmp, self.options.sync_policy)?;
        let empty_size = WALRecord::new(sequence, Vec::new()).encoded_size();
        for (name, bucket) in &state.buckets {
            let mut ops = vec![WALOp::create_bucket(name.clone())];
            let mut size = empty_size + ops[0].encoded_size();
            let mut cursor = bucket.cursor();
            while cursor.is_valid() {
                let op = WALOp::put(name.clone(), cursor.key().to_vec(), cursor.value().to_vec());
                if size + op.encoded_size() > MAX_RECORD_SIZE {
                    writer.append(&WALRecord::new(sequence, std::mem::take(&mut ops)))?;
                    size = empty_size;
                }
                size += op.encoded_size();
                ops.push(op);
                cursor.next()?;
            }
            writer.append(&WALRecord::new(sequence, ops))?;
        }
        if state.buckets.is_empty() {
            writer.append(&WALRecord::new(sequence, Vec::new()))?;
        }
        writer.sync()?;
        fs::rename(&tmp, &self.path)?;
        sync_parent_dir(&self.path)?;

        state.wal = writer;

        info!(
            path = %self.path.display(),
            before_bytes = before,
            after_bytes = state.wal.offset(),
            "compacted log"
        );
        Ok(())
    }
}

/// Replay the log at `path` into fresh buckets.
///
/// Returns the buckets and the last committed sequence number. Cuts the
/// file back to its valid prefix if the tail is torn.
fn recover(path: &Path) -> Result<(BTreeMap<BucketName, Bucket>, u64)> {
    let mut buckets = BTreeMap::new();
    let mut sequence = 0;
    if !path.exists() {
        return Ok((buckets, sequence));
    }

    let reader = WALReader::new(path)?;
    let mut records = reader.iter();
    let mut replayed = 0usize;
    for record in records.by_ref() {
        let record = record?;
        for op in record.ops {
            apply(&mut buckets, op)?;
        }
        sequence = record.sequence;
        replayed += 1;
    }

    let valid = records.offset();
    if valid < reader.len() {
        warn!(
            path = %path.display(),
            valid_bytes = valid,
            discarded_bytes = reader.len() - valid,
            "discarding torn log tail"
        );
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(valid as u64)?;
        file.sync_all()?;
    }

    debug!(replayed, sequence, "replayed log");
    Ok((buckets, sequence))
}

fn apply(buckets: &mut BTreeMap<BucketName, Bucket>, op: WALOp) -> Result<()> {
    match op.op_type {
        RecordType::CreateBucket => {
            buckets.entry(op.bucket).or_default();
        }
        RecordType::DeleteBucket => {
            buckets.remove(&op.bucket);
        }
        RecordType::Put => {
            replay_target(buckets, &op.bucket)?.put(op.key, op.value);
        }
        RecordType::Delete => {
            replay_target(buckets, &op.bucket)?.delete(&op.key);
        }
    }
    Ok(())
}

fn replay_target<'a>(
    buckets: &'a mut BTreeMap<BucketName, Bucket>,
    name: &[u8],
) -> Result<&'a mut Bucket> {
    buckets
        .get_mut(name)
        .ok_or_else(|| Error::Corruption("log op on a bucket that does not exist".into()))
}

/// Make a rename inside the log's directory durable.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

// Directories cannot be opened for fsync here; the rename is left to the OS.
#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> Result<()> {
    Ok(())
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
