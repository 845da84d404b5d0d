// Bucket tests
// Put/get/delete on one ordered namespace, and the exclusive-bound cursors
// the scans start from.

use bucketdb::bucket::Bucket;
use bucketdb::iterator::StorageIterator;

fn bucket_with(keys: &[&str]) -> Bucket {
    let mut b = Bucket::new();
    for k in keys {
        b.put(k.as_bytes().to_vec(), k.to_uppercase().into_bytes());
    }
    b
}

// =============================================================================
// Test 1: Put, overwrite, get
// =============================================================================
#[test]
fn put_then_get() {
    let mut b = Bucket::new();
    assert_eq!(b.put(b"k".to_vec(), b"v1".to_vec()), None);
    assert_eq!(b.put(b"k".to_vec(), b"v2".to_vec()), Some(b"v1".to_vec()));
    assert_eq!(b.get(b"k"), Some(b"v2".as_slice()));
    assert_eq!(b.len(), 1);
    assert_eq!(b.size(), 3);
}

// =============================================================================
// Test 2: Empty value is stored, not a delete
// =============================================================================
#[test]
fn empty_value_is_present() {
    let mut b = Bucket::new();
    b.put(b"idx".to_vec(), Vec::new());
    assert_eq!(b.get(b"idx"), Some(b"".as_slice()));
    assert!(!b.is_empty());
}

// =============================================================================
// Test 3: Delete physically removes the key
// =============================================================================
#[test]
fn delete_removes_key() {
    let mut b = bucket_with(&["a", "b"]);
    assert_eq!(b.delete(b"a"), Some(b"A".to_vec()));
    assert_eq!(b.delete(b"a"), None);
    assert_eq!(b.get(b"a"), None);
    assert_eq!(b.len(), 1);

    let cursor = b.cursor();
    assert_eq!(cursor.key(), b"b");
}

// =============================================================================
// Test 4: cursor_after skips an exact match
// =============================================================================
#[test]
fn cursor_after_is_exclusive() {
    let b = bucket_with(&["a", "c", "e"]);

    assert_eq!(b.cursor_after(b"c").unwrap().key(), b"e");
    assert_eq!(b.cursor_after(b"b").unwrap().key(), b"c");
    assert_eq!(b.cursor_after(b"").unwrap().key(), b"a");
    assert!(!b.cursor_after(b"e").unwrap().is_valid());
}

// =============================================================================
// Test 5: cursor_before lands strictly below the bound
// =============================================================================
#[test]
fn cursor_before_is_exclusive() {
    let b = bucket_with(&["a", "c", "e"]);

    assert_eq!(b.cursor_before(b"c").unwrap().key(), b"a");
    assert_eq!(b.cursor_before(b"d").unwrap().key(), b"c");
    assert_eq!(b.cursor_before(b"z").unwrap().key(), b"e");
    assert!(!b.cursor_before(b"a").unwrap().is_valid());
    assert!(!b.cursor_before(b"").unwrap().is_valid());
}

// =============================================================================
// Test 6: Cursors on an empty bucket
// =============================================================================
#[test]
fn cursors_on_empty_bucket_are_invalid() {
    let b = Bucket::new();
    assert!(!b.cursor().is_valid());
    assert!(!b.cursor_after(b"x").unwrap().is_valid());
    assert!(!b.cursor_before(b"x").unwrap().is_valid());
}
