use crate::error::Result;

/// The cursor abstraction over one ordered bucket.
///
/// Every scan in the hashmap and sorted-set layers is written against this
/// trait: position with `seek` / `seek_to_first` / `seek_to_last`, then walk
/// with `next` or `prev` while `is_valid()` holds.
pub trait StorageIterator {
    /// Returns the current key. Only valid when is_valid() is true.
    fn key(&self) -> &[u8];

    /// Returns the current value. Only valid when is_valid() is true.
    fn value(&self) -> &[u8];

    /// Returns true if the iterator is positioned at a valid entry.
    fn is_valid(&self) -> bool;

    /// Advances to the next entry. Stepping past the last entry invalidates.
    fn next(&mut self) -> Result<()>;

    /// Steps back to the previous entry. Stepping before the first entry invalidates.
    fn prev(&mut self) -> Result<()>;

    /// Positions the iterator at the first entry with key >= target.
    fn seek(&mut self, key: &[u8]) -> Result<()>;

    /// Positions the iterator at the smallest key.
    fn seek_to_first(&mut self) -> Result<()>;

    /// Positions the iterator at the largest key.
    fn seek_to_last(&mut self) -> Result<()>;
}
