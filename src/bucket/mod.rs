pub mod skiplist;

use skiplist::{SkipList, SkipListIterator};

use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::types::{Key, Value};

/// Cursor over one bucket. Positioned at the first key when created.
pub type Cursor<'a> = SkipListIterator<'a>;

/// One ordered namespace of the store. Wraps a SkipList.
///
/// There are no tombstones: an empty value is an
/// ordinary value (sorted-set index entries are all empty), so `delete`
/// physically unlinks the key.
#[derive(Default)]
pub struct Bucket {
    data: SkipList,
}

impl Bucket {
    /// Create a new empty bucket.
    pub fn new() -> Self {
        Bucket {
            data: SkipList::new(),
        }
    }

    /// Insert or update a key-value pair. Returns the previous value.
    pub fn put(&mut self, key: Key, value: Value) -> Option<Value> {
        self.data.insert(key, value)
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key)
    }

    /// Remove a key. Returns the removed value, `None` if it was absent.
    pub fn delete(&mut self, key: &[u8]) -> Option<Value> {
        self.data.remove(key)
    }

    /// Open a cursor over the bucket.
    pub fn cursor(&self) -> Cursor<'_> {
        self.data.iter()
    }

    /// Cursor at the first key strictly greater than `start`.
    pub fn cursor_after(&self, start: &[u8]) -> Result<Cursor<'_>> {
        let mut cursor = self.cursor();
        cursor.seek(start)?;
        if cursor.is_valid() && cursor.key() == start {
            cursor.next()?;
        }
        Ok(cursor)
    }

    /// Cursor at the last key strictly less than `start`.
    pub fn cursor_before(&self, start: &[u8]) -> Result<Cursor<'_>> {
        let mut cursor = self.cursor();
        cursor.seek(start)?;
        if cursor.is_valid() {
            // seek landed on the first key >= start
            cursor.prev()?;
        } else {
            cursor.seek_to_last()?;
        }
        Ok(cursor)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes held by keys and values.
    pub fn size(&self) -> usize {
        self.data.size_bytes()
    }
}
