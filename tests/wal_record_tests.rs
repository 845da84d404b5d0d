// WAL record format tests
// One record per committed transaction; every op survives encode/decode
// and any damage is caught by the CRC.

use bucketdb::Error;
use bucketdb::wal::{RecordType, WALOp, WALRecord};

fn sample() -> WALRecord {
    WALRecord::new(
        7,
        vec![
            WALOp::create_bucket(b"\x1eusers".to_vec()),
            WALOp::put(b"\x1eusers".to_vec(), b"alice".to_vec(), b"admin".to_vec()),
            WALOp::delete(b"\x1eusers".to_vec(), b"bob".to_vec()),
            WALOp::delete_bucket(b"\x1fold".to_vec()),
        ],
    )
}

// =============================================================================
// Test 1: A whole transaction decodes back in order
// =============================================================================
#[test]
fn multi_op_record_decodes_in_order() {
    let record = sample();
    let decoded = WALRecord::decode(&record.encode().unwrap()).unwrap();

    assert_eq!(decoded.sequence, 7);
    let kinds: Vec<RecordType> = decoded.ops.iter().map(|op| op.op_type).collect();
    assert_eq!(
        kinds,
        vec![
            RecordType::CreateBucket,
            RecordType::Put,
            RecordType::Delete,
            RecordType::DeleteBucket
        ]
    );
    assert_eq!(decoded.ops[1].key, b"alice");
    assert_eq!(decoded.ops[1].value, b"admin");
    assert!(decoded.ops[2].value.is_empty());
    assert_eq!(decoded, record);
}

// =============================================================================
// Test 2: Empty values are kept
// =============================================================================
// Sorted-set index entries have empty values, so an empty value must not be
// confused with a delete.
#[test]
fn empty_value_put_stays_a_put() {
    let record = WALRecord::new(1, vec![WALOp::put(b"b".to_vec(), b"k".to_vec(), Vec::new())]);
    let decoded = WALRecord::decode(&record.encode().unwrap()).unwrap();
    assert_eq!(decoded.ops[0].op_type, RecordType::Put);
    assert!(decoded.ops[0].value.is_empty());
}

// =============================================================================
// Test 3: Flipped byte is detected
// =============================================================================
#[test]
fn corrupted_byte_detected() {
    let mut encoded = sample().encode().unwrap();
    let last = encoded.len() - 1;
    encoded[last] ^= 0xFF;
    assert!(matches!(WALRecord::decode(&encoded), Err(Error::Corruption(_))));
}

// =============================================================================
// Test 4: Truncated record fails decode
// =============================================================================
#[test]
fn truncated_record_fails() {
    let encoded = sample().encode().unwrap();
    for cut in [0, 3, 10, encoded.len() / 2, encoded.len() - 1] {
        assert!(WALRecord::decode(&encoded[..cut]).is_err(), "cut at {}", cut);
    }
}

// =============================================================================
// Test 5: encoded_size matches actual size
// =============================================================================
#[test]
fn encoded_size_matches_actual() {
    let record = sample();
    assert_eq!(record.encoded_size(), record.encode().unwrap().len());

    let empty = WALRecord::new(0, Vec::new());
    assert_eq!(empty.encoded_size(), empty.encode().unwrap().len());
}

// =============================================================================
// Test 6: Decode reads only the first record
// =============================================================================
// The reader hands decode the rest of the file; anything past the record's
// own length belongs to the next one.
#[test]
fn decode_ignores_bytes_after_the_record() {
    let first = sample();
    let second = WALRecord::new(8, vec![WALOp::create_bucket(b"x".to_vec())]);
    let mut buf = first.encode().unwrap();
    buf.extend_from_slice(&second.encode().unwrap());

    let decoded = WALRecord::decode(&buf).unwrap();
    assert_eq!(decoded, first);
    let rest = &buf[decoded.encoded_size()..];
    assert_eq!(WALRecord::decode(rest).unwrap(), second);
}

// =============================================================================
// Test 7: Large values
// =============================================================================
#[test]
fn large_key_and_value() {
    let key = vec![0xAB; 10_000];
    let value = vec![0xCD; 100_000];
    let record = WALRecord::new(1, vec![WALOp::put(b"b".to_vec(), key.clone(), value.clone())]);
    let decoded = WALRecord::decode(&record.encode().unwrap()).unwrap();
    assert_eq!(decoded.ops[0].key, key);
    assert_eq!(decoded.ops[0].value, value);
}

// =============================================================================
// Test 8: A record with no ops still carries its sequence
// =============================================================================
// Compaction of an empty store writes one of these.
#[test]
fn empty_record_keeps_sequence() {
    let record = WALRecord::new(42, Vec::new());
    let decoded = WALRecord::decode(&record.encode().unwrap()).unwrap();
    assert_eq!(decoded.sequence, 42);
    assert!(decoded.ops.is_empty());
}
