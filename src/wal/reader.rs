use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::wal::record::WALRecord;

/// The whole log file, loaded for replay.
///
/// `DB::open` walks it with [`WALReader::iter`], applies each committed
/// transaction to fresh buckets, and then cuts the file back to
/// [`WALIterator::offset`] if anything was left over.
pub struct WALReader {
    data: Vec<u8>,
}

impl WALReader {
    pub fn new(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(WALReader { data })
    }

    /// Transactions in commit order, starting at the head of the file.
    pub fn iter(&self) -> WALIterator<'_> {
        WALIterator {
            data: &self.data,
            offset: 0,
        }
    }

    /// File length, including any unreadable tail.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Yields one [`WALRecord`] per committed transaction.
///
/// Ends quietly at the first record that is short or fails its CRC. The log
/// is only ever appended to, so such a record is the one a crash interrupted
/// and nothing after it was acknowledged.
pub struct WALIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl WALIterator<'_> {
    /// End of the last record yielded. Once the iterator is exhausted this
    /// is the length of the replayable prefix.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for WALIterator<'_> {
    type Item = Result<WALRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.offset..).filter(|r| !r.is_empty())?;
        let record = WALRecord::decode(rest).ok()?;
        self.offset += record.encoded_size();
        Some(Ok(record))
    }
}
