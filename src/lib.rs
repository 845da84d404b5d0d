//! # bucketdb
//!
//! Hashmaps and sorted sets on top of a small embedded key-value store.
//!
//! ## Core idea
//! The store only knows flat, ordered buckets of byte keys, plus
//! transactions. A hashmap is one bucket. A sorted set is two buckets kept
//! in lockstep: one ordered by `score ‖ member` for range scans, one keyed
//! by member for point lookups. Every mutating call runs in one write
//! transaction, so the two never disagree after a commit.
//!
//! ```no_run
//! use bucketdb::DB;
//!
//! # fn main() -> bucketdb::Result<()> {
//! let db = DB::open("scores.db")?;
//! db.zset("board", b"alice", 10)?;
//! db.zset("board", b"bob", 5)?;
//! for entry in db.zscan("board", b"", None, 10).list() {
//!     println!("{} {}", entry.key_string(), entry.value_uint());
//! }
//! db.close()
//! # }
//! ```

pub mod bucket;
pub mod codec;
pub mod db;
pub mod error;
mod hash;
pub mod iterator;
pub mod reply;
pub mod types;
pub mod wal;
mod zset;

// Public re-exports for the top-level API
pub use db::{DB, MAX_KEY_SIZE, MAX_VALUE_SIZE, Options, ReadTx, Stats, WriteTx};
pub use error::{Error, Result};
pub use reply::{Entry, Reply, ReplyState};
pub use wal::SyncPolicy;
