use crate::error::{Error, Result};

/// Kind of change a WAL op applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Put = 0x01,
    Delete = 0x02,
    CreateBucket = 0x03,
    DeleteBucket = 0x04,
}

impl RecordType {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x01 => Ok(RecordType::Put),
            0x02 => Ok(RecordType::Delete),
            0x03 => Ok(RecordType::CreateBucket),
            0x04 => Ok(RecordType::DeleteBucket),
            _ => Err(Error::Corruption(format!("invalid record type: {}", byte))),
        }
    }
}

/// One change inside a committed transaction.
///
/// Bucket ops leave `key` and `value` empty; `Delete` leaves `value` empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WALOp {
    pub op_type: RecordType,
    pub bucket: Vec<u8>,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl WALOp {
    pub fn put(bucket: Vec<u8>, key: Vec<u8>, value: Vec<u8>) -> Self {
        WALOp {
            op_type: RecordType::Put,
            bucket,
            key,
            value,
        }
    }

    pub fn delete(bucket: Vec<u8>, key: Vec<u8>) -> Self {
        WALOp {
            op_type: RecordType::Delete,
            bucket,
            key,
            value: Vec::new(),
        }
    }

    pub fn create_bucket(bucket: Vec<u8>) -> Self {
        WALOp {
            op_type: RecordType::CreateBucket,
            bucket,
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    pub fn delete_bucket(bucket: Vec<u8>) -> Self {
        WALOp {
            op_type: RecordType::DeleteBucket,
            bucket,
            key: Vec::new(),
            value: Vec::new(),
        }
    }

    /// Bytes this op adds to an encoded record.
    pub fn encoded_size(&self) -> usize {
        OP_HEADER_SIZE + self.bucket.len() + self.key.len() + self.value.len()
    }
}

/// A committed write transaction: every op it made, in order.
///
/// On-disk format:
/// ```text
/// ┌──────────┬────────┬──────────┬───────────┬─────────┐
/// │ CRC (4B) │ Len(4B)│ Seq (8B) │ Count (4B)│ ops ... │
/// └──────────┴────────┴──────────┴───────────┴─────────┘
///
/// op:
/// ┌──────────┬──────────────┬───────────┬───────────┬────────┬─────┬───────┐
/// │ Type(1B) │ BucketLen(4B)│ KeyLen(4B)│ ValLen(4B)│ bucket │ key │ value │
/// └──────────┴──────────────┴───────────┴───────────┴────────┴─────┴───────┘
/// ```
///
/// CRC covers everything after the CRC field itself. A transaction is either
/// entirely in the log or, after a crash mid-append, fails its CRC and is
/// dropped with everything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WALRecord {
    pub sequence: u64,
    pub ops: Vec<WALOp>,
}

// Header sizes
const CRC_SIZE: usize = 4;
const LEN_SIZE: usize = 4;
const SEQ_SIZE: usize = 8;
const COUNT_SIZE: usize = 4;
const HEADER_SIZE: usize = CRC_SIZE + LEN_SIZE + SEQ_SIZE + COUNT_SIZE;
const OP_HEADER_SIZE: usize = 1 + 4 + 4 + 4;

/// Largest record `encode` accepts: the length field is a `u32`.
pub const MAX_RECORD_SIZE: usize = CRC_SIZE + LEN_SIZE + u32::MAX as usize;

impl WALRecord {
    pub fn new(sequence: u64, ops: Vec<WALOp>) -> Self {
        WALRecord { sequence, ops }
    }

    /// Serialize this record to bytes (including CRC header).
    ///
    /// Fails with [`Error::InvalidArgument`] if any length does not fit its
    /// 4-byte field; nothing is truncated.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let total_len = self.encoded_size();
        let payload_len = u32_len(total_len - CRC_SIZE - LEN_SIZE, "record")?;

        let mut buf = Vec::with_capacity(total_len);

        // Reserve space for CRC (we'll fill it at the end)
        buf.extend_from_slice(&[0u8; CRC_SIZE]);
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&u32_len(self.ops.len(), "op count")?.to_le_bytes());

        for op in &self.ops {
            buf.push(op.op_type as u8);
            buf.extend_from_slice(&u32_len(op.bucket.len(), "bucket name")?.to_le_bytes());
            buf.extend_from_slice(&u32_len(op.key.len(), "key")?.to_le_bytes());
            buf.extend_from_slice(&u32_len(op.value.len(), "value")?.to_le_bytes());
            buf.extend_from_slice(&op.bucket);
            buf.extend_from_slice(&op.key);
            buf.extend_from_slice(&op.value);
        }

        let crc = crc32fast::hash(&buf[CRC_SIZE..]);
        buf[0..CRC_SIZE].copy_from_slice(&crc.to_le_bytes());

        Ok(buf)
    }

    /// Deserialize a record from the front of `data`. Returns error if the
    /// record is short or its CRC doesn't match.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Corruption("record too short".into()));
        }

        let stored_crc = read_u32(data, 0)?;
        let payload_len = read_u32(data, CRC_SIZE)? as usize;

        let total_len = CRC_SIZE + LEN_SIZE + payload_len;
        if total_len < HEADER_SIZE || data.len() < total_len {
            return Err(Error::Corruption("record truncated".into()));
        }

        let computed_crc = crc32fast::hash(&data[CRC_SIZE..total_len]);
        if stored_crc != computed_crc {
            return Err(Error::Corruption("CRC mismatch".into()));
        }

        let record = &data[..total_len];
        let mut offset = CRC_SIZE + LEN_SIZE;

        let sequence = read_u64(record, offset)?;
        offset += SEQ_SIZE;
        let count = read_u32(record, offset)? as usize;
        offset += COUNT_SIZE;

        let mut ops = Vec::with_capacity(count.min(payload_len / OP_HEADER_SIZE));
        for _ in 0..count {
            let op_type = RecordType::from_u8(*record.get(offset).ok_or_else(op_overrun)?)?;
            let bucket_len = read_u32(record, offset + 1)? as usize;
            let key_len = read_u32(record, offset + 5)? as usize;
            let value_len = read_u32(record, offset + 9)? as usize;
            offset += OP_HEADER_SIZE;

            let bucket = take(record, &mut offset, bucket_len)?;
            let key = take(record, &mut offset, key_len)?;
            let value = take(record, &mut offset, value_len)?;
            ops.push(WALOp {
                op_type,
                bucket,
                key,
                value,
            });
        }

        if offset != total_len {
            return Err(Error::Corruption("trailing bytes in record".into()));
        }

        Ok(WALRecord { sequence, ops })
    }

    /// Size of this record when serialized on disk.
    pub fn encoded_size(&self) -> usize {
        HEADER_SIZE + self.ops.iter().map(WALOp::encoded_size).sum::<usize>()
    }
}

fn u32_len(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len)
        .map_err(|_| Error::InvalidArgument(format!("{what} of {len} bytes is too large to log")))
}

fn op_overrun() -> Error {
    Error::Corruption("op exceeds record".into())
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(op_overrun)
}

fn read_u64(data: &[u8], offset: usize) -> Result<u64> {
    data.get(offset..offset + 8)
        .and_then(|b| b.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or_else(op_overrun)
}

fn take(data: &[u8], offset: &mut usize, len: usize) -> Result<Vec<u8>> {
    let end = offset.checked_add(len).ok_or_else(op_overrun)?;
    let bytes = data.get(*offset..end).ok_or_else(op_overrun)?.to_vec();
    *offset = end;
    Ok(bytes)
}
