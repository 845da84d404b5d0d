use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::debug;

use crate::error::{Error, Result};

/// How long to sleep between attempts while another holder has the lock.
const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on `<store>.lock`, held for the life of a `DB`.
///
/// Released when dropped (and by the OS if the process dies).
pub(crate) struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Take the lock, retrying until `timeout` has passed.
    pub(crate) fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)?;

        let started = Instant::now();
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    debug!(path = %path.display(), "acquired store lock");
                    return Ok(FileLock {
                        file,
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if started.elapsed() >= timeout {
                        return Err(Error::Timeout);
                    }
                    thread::sleep(RETRY_INTERVAL.min(timeout));
                }
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(path = %self.path.display(), error = %e, "failed to release store lock");
        }
    }
}
