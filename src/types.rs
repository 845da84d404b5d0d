/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// Raw bucket name bytes: a one-byte family tag followed by the structure name.
pub type BucketName = Vec<u8>;

/// Bucket family tag for hashmaps: `field -> value`.
pub const HASH_PREFIX: u8 = 30;

/// Bucket family tag for the sorted-set score index: `score ‖ member -> ""`.
pub const ZSET_KEY_PREFIX: u8 = 31;

/// Bucket family tag for the sorted-set member index: `member -> score`.
pub const ZSET_SCORE_PREFIX: u8 = 29;
