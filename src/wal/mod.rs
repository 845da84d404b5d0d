pub mod reader;
pub mod record;
pub mod writer;

pub use record::{MAX_RECORD_SIZE, RecordType, WALOp, WALRecord};

/// Controls when the WAL is fsync'd to disk.
///
/// Trade-off: durability vs throughput.
///   - EveryWrite: zero data loss, ~10x slower (each fsync waits for disk)
///   - EveryNWrites: batched durability, lose up to N commits on crash
///   - EveryNMillis: bounded loss window, much higher throughput
///
/// Whatever the policy, a transaction is either fully replayed or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// fsync after every committed transaction. Safest, slowest.
    #[default]
    EveryWrite,
    /// fsync every N commits. Batched durability.
    EveryNWrites(usize),
    /// fsync on the first commit after N milliseconds since the last sync.
    EveryNMillis(u64),
}

