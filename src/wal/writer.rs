use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::Result;
use crate::wal::SyncPolicy;
use crate::wal::record::WALRecord;

/// Appends committed transactions to the log file.
///
/// A write transaction is only acknowledged once its record is in the
/// log; on reopen the log is replayed to rebuild every bucket.
///
/// Two layers of buffering:
///   BufWriter.flush()  → Rust buffer → OS page cache
///   file.sync_all()    → OS page cache → physical disk
pub struct WALWriter {
    writer: BufWriter<File>,
    offset: u64,
    sync_policy: SyncPolicy,
    writes_since_sync: usize,
    last_sync: Instant,
}

impl WALWriter {
    /// Open (or create) a WAL file for appending.
    pub fn new(path: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let offset = file.metadata()?.len();

        Ok(WALWriter {
            writer: BufWriter::new(file),
            offset,
            sync_policy,
            writes_since_sync: 0,
            last_sync: Instant::now(),
        })
    }

    /// Append a record to the WAL.
    /// Depending on SyncPolicy, may fsync after this write.
    ///
    /// If the write or the sync fails, the file is cut back to where the
    /// record started so the next append lands on a clean tail.
    pub fn append(&mut self, record: &WALRecord) -> Result<()> {
        let start = self.offset;
        if let Err(e) = self.write_record(record) {
            if let Err(cleanup) = self.discard_tail(start) {
                warn!(
                    offset = start,
                    error = %cleanup,
                    "failed to cut back WAL after append error"
                );
            }
            return Err(e);
        }
        Ok(())
    }

    fn write_record(&mut self, record: &WALRecord) -> Result<()> {
        let encoded = record.encode()?;

        self.writer.write_all(&encoded)?;
        self.writer.flush()?;
        self.offset += encoded.len() as u64;
        self.writes_since_sync += 1;

        let due = match self.sync_policy {
            SyncPolicy::EveryWrite => true,
            SyncPolicy::EveryNWrites(n) => self.writes_since_sync >= n,
            SyncPolicy::EveryNMillis(ms) => self.last_sync.elapsed() >= Duration::from_millis(ms),
        };
        if due {
            self.sync()?;
        }

        Ok(())
    }

    /// Drop anything buffered and truncate the file to `offset`.
    fn discard_tail(&mut self, offset: u64) -> Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        // The old BufWriter flushes whatever it still holds on drop; the
        // truncate below removes it again.
        drop(std::mem::replace(&mut self.writer, BufWriter::new(file)));
        self.writer.get_ref().set_len(offset)?;
        self.offset = offset;
        Ok(())
    }

    /// Force fsync to disk. Ensures all buffered writes are durable.
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.writes_since_sync = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Current file offset (bytes in the log so far).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Appends since the last fsync.
    pub fn writes_since_sync(&self) -> usize {
        self.writes_since_sync
    }
}
