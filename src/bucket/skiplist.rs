use rand::Rng;

use crate::error::Result;
use crate::iterator::StorageIterator;

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Arena index of the head sentinel.
const HEAD: usize = 0;

/// A single node in the skip list.
///
/// Each node has `height` forward pointers. Level 0 contains all nodes
/// (a regular linked list). Higher levels skip over nodes, enabling
/// O(log n) average-case search.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
struct SkipNode {
    key: Vec<u8>,
    value: Vec<u8>,
    forward: Vec<Option<usize>>, // indices into SkipList.nodes
}

/// A probabilistic sorted map from byte keys to byte values.
///
/// Nodes live in an arena and link to each other by index, so there is no
/// unsafe code and removed slots are recycled through a free list. There are
/// no back pointers: stepping backwards is a fresh O(log n) search for the
/// last key smaller than the current one.
///
/// Average case: O(log n) insert, remove, lookup, seek and prev.
pub struct SkipList {
    nodes: Vec<SkipNode>,
    free: Vec<usize>,
    height: usize,
    len: usize,
    size_bytes: usize,
}

impl SkipList {
    /// Create a new empty skip list.
    pub fn new() -> Self {
        let head = SkipNode {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_HEIGHT],
        };
        SkipList {
            nodes: vec![head],
            free: Vec::new(),
            height: 1,
            len: 0,
            size_bytes: 0,
        }
    }

    /// Insert a key-value pair. Overwrites if key already exists and
    /// returns the previous value.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Option<Vec<u8>> {
        let update = self.find_predecessors(&key);

        if let Some(idx) = self.nodes[update[0]].forward[0] {
            if self.nodes[idx].key == key {
                let node = &mut self.nodes[idx];
                self.size_bytes = self.size_bytes - node.value.len() + value.len();
                return Some(std::mem::replace(&mut node.value, value));
            }
        }

        // Levels above the current height already have HEAD as predecessor.
        let height = self.random_height();
        if height > self.height {
            self.height = height;
        }

        self.size_bytes += key.len() + value.len();
        let forward = (0..height)
            .map(|level| self.nodes[update[level]].forward[level])
            .collect();
        let idx = self.alloc(SkipNode { key, value, forward });
        for (level, &pred) in update.iter().enumerate().take(height) {
            self.nodes[pred].forward[level] = Some(idx);
        }
        self.len += 1;
        None
    }

    /// Look up a key. Returns the value if found.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let idx = self.seek_index(key)?;
        let node = &self.nodes[idx];
        (node.key == key).then_some(node.value.as_slice())
    }

    /// Unlink a key. Returns its value if it was present.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let update = self.find_predecessors(key);
        let idx = self.nodes[update[0]].forward[0]?;
        if self.nodes[idx].key != key {
            return None;
        }

        for level in 0..self.nodes[idx].forward.len() {
            let next = self.nodes[idx].forward[level];
            self.nodes[update[level]].forward[level] = next;
        }
        while self.height > 1 && self.nodes[HEAD].forward[self.height - 1].is_none() {
            self.height -= 1;
        }

        let node = &mut self.nodes[idx];
        let key_len = node.key.len();
        let value = std::mem::take(&mut node.value);
        node.key = Vec::new();
        node.forward = Vec::new();
        self.free.push(idx);
        self.len -= 1;
        self.size_bytes -= key_len + value.len();
        Some(value)
    }

    /// Number of entries in the skip list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the skip list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Approximate memory usage in bytes: the sum of live key and value lengths.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Create an iterator positioned at the first entry.
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            current: self.first_index(),
        }
    }

    /// For every level, the last node whose key is < `key`.
    fn find_predecessors(&self, key: &[u8]) -> [usize; MAX_HEIGHT] {
        let mut update = [HEAD; MAX_HEIGHT];
        let mut x = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[x].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    x = next;
                } else {
                    break;
                }
            }
            update[level] = x;
        }
        update
    }

    /// First node with key >= `key`.
    fn seek_index(&self, key: &[u8]) -> Option<usize> {
        self.nodes[self.find_predecessors(key)[0]].forward[0]
    }

    /// Last node with key < `key`.
    fn prev_index(&self, key: &[u8]) -> Option<usize> {
        let pred = self.find_predecessors(key)[0];
        (pred != HEAD).then_some(pred)
    }

    fn first_index(&self) -> Option<usize> {
        self.nodes[HEAD].forward[0]
    }

    fn last_index(&self) -> Option<usize> {
        let mut x = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[x].forward[level] {
                x = next;
            }
        }
        (x != HEAD).then_some(x)
    }

    fn alloc(&mut self, node: SkipNode) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Generate a random level for a new node.
    /// Each level has a 1/4 probability (LevelDB uses 1/4, not 1/2).
    fn random_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut height = 1;
        while height < MAX_HEIGHT && rng.gen_ratio(1, 4) {
            height += 1;
        }
        height
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over skip list entries in sorted order.
///
/// Forward steps follow level 0 pointers; backward steps re-search from the
/// head for the predecessor of the current key.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl StorageIterator for SkipListIterator<'_> {
    fn key(&self) -> &[u8] {
        match self.current {
            Some(idx) => self.list.nodes[idx].key.as_slice(),
            None => &[],
        }
    }

    fn value(&self) -> &[u8] {
        match self.current {
            Some(idx) => self.list.nodes[idx].value.as_slice(),
            None => &[],
        }
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        self.current = self.current.and_then(|idx| self.list.nodes[idx].forward[0]);
        Ok(())
    }

    fn prev(&mut self) -> Result<()> {
        self.current = self
            .current
            .and_then(|idx| self.list.prev_index(&self.list.nodes[idx].key));
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.current = self.list.seek_index(key);
        Ok(())
    }

    fn seek_to_first(&mut self) -> Result<()> {
        self.current = self.list.first_index();
        Ok(())
    }

    fn seek_to_last(&mut self) -> Result<()> {
        self.current = self.list.last_index();
        Ok(())
    }
}
