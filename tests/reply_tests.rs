// Reply decoder tests
// Decoders never fail: missing or short data yields a zero value.

use bucketdb::codec::encode_score;
use bucketdb::{Entry, Error, Reply, ReplyState};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq)]
struct Profile {
    name: String,
    level: u32,
}

fn reply(values: &[&[u8]]) -> Reply {
    Reply::ok(values.iter().map(|v| v.to_vec()).collect())
}

// =============================================================================
// Test 1: Status strings
// =============================================================================
#[test]
fn status_strings() {
    assert_eq!(ReplyState::Ok.as_str(), "ok");
    assert_eq!(ReplyState::NotFound.to_string(), "not_found");
    assert_eq!(ReplyState::BucketNotFound.as_str(), "bucket_not_found");
    assert_eq!(ReplyState::Error.as_str(), "error");
    assert_eq!(ReplyState::ClientError.as_str(), "client_error");
}

// =============================================================================
// Test 2: Errors map onto reply states
// =============================================================================
#[test]
fn errors_map_to_states() {
    let cases = [
        (Error::NotFound, ReplyState::NotFound),
        (Error::BucketNotFound, ReplyState::BucketNotFound),
        (Error::InvalidArgument("x".into()), ReplyState::ClientError),
        (Error::Overflow, ReplyState::Error),
        (Error::Timeout, ReplyState::Error),
        (Error::Corruption("x".into()), ReplyState::Error),
    ];
    for (err, state) in cases {
        let r = Reply::from_error(err);
        assert_eq!(r.state, state);
        assert!(r.is_empty());
    }
}

// =============================================================================
// Test 3: Empty reply decodes to zero values
// =============================================================================
#[test]
fn empty_reply_decodes_to_defaults() {
    let r = Reply::from_error(Error::NotFound);
    assert_eq!(r.string(), "");
    assert_eq!(r.uint(), 0);
    assert_eq!(r.int(), 0);
    assert_eq!(r.json::<Profile>(), None);
    assert!(r.list().is_empty());
    assert!(r.dict().is_empty());
}

// =============================================================================
// Test 4: Numeric decoders
// =============================================================================
// Short values read as 0; longer ones use their first 8 bytes.
#[test]
fn numeric_decoders_are_lenient() {
    assert_eq!(reply(&[&encode_score(42)]).uint(), 42);
    assert_eq!(reply(&[b"abc"]).uint(), 0);

    let mut long = encode_score(7).to_vec();
    long.extend_from_slice(b"tail");
    assert_eq!(reply(&[&long]).uint(), 7);

    assert_eq!(reply(&[&encode_score(u64::MAX)]).int(), -1);
}

// =============================================================================
// Test 5: JSON
// =============================================================================
#[test]
fn json_decodes_first_value() {
    let r = reply(&[br#"{"name":"ada","level":3}"#, b"ignored"]);
    assert_eq!(
        r.json::<Profile>(),
        Some(Profile {
            name: "ada".into(),
            level: 3
        })
    );
    assert_eq!(reply(&[b"not json"]).json::<Profile>(), None);
    assert_eq!(reply(&[b"[1,2,3]"]).json::<Vec<u8>>(), Some(vec![1, 2, 3]));
}

// =============================================================================
// Test 6: list pairs values and drops a trailing one
// =============================================================================
#[test]
fn list_pairs_values() {
    let r = reply(&[b"a", b"1", b"b", b"2", b"dangling"]);
    let entries = r.list();
    assert_eq!(
        entries,
        vec![
            Entry {
                key: b"a".to_vec(),
                value: b"1".to_vec()
            },
            Entry {
                key: b"b".to_vec(),
                value: b"2".to_vec()
            },
        ]
    );
    assert_eq!(entries[1].key_string(), "b");
    assert_eq!(entries[1].value_string(), "2");
    assert_eq!(entries[0].value_uint(), 0);
}

// =============================================================================
// Test 7: dict keeps the last duplicate
// =============================================================================
#[test]
fn dict_last_write_wins() {
    let r = reply(&[b"k", b"first", b"other", b"x", b"k", b"second"]);
    let map = r.dict();
    assert_eq!(map.len(), 2);
    assert_eq!(map["k"], b"second".to_vec());
    assert_eq!(map["other"], b"x".to_vec());
}

// =============================================================================
// Test 8: Entry decoders
// =============================================================================
#[test]
fn entry_decoders() {
    let e = Entry {
        key: vec![0xFF, b'a'],
        value: encode_score(9).to_vec(),
    };
    assert_eq!(e.key_string(), "\u{FFFD}a");
    assert_eq!(e.value_uint(), 9);
    assert_eq!(e.value_int(), 9);
    assert_eq!(e.value_json::<u32>(), None);

    let j = Entry {
        key: b"p".to_vec(),
        value: br#"{"name":"bo","level":1}"#.to_vec(),
    };
    assert_eq!(j.value_json::<Profile>().unwrap().name, "bo");
}
