//! WAL Record Module
//!
//! Mutation records and their on-disk frame encoding.
//!
//! # Frame Layout (little-endian)
//! ```text
//! len: u32 | crc32(payload): u32 | payload
//! payload = op: u8 | key_len: u32 | key | [value_len: u32 | value]
//! ```

/// Frame header size: length (4) + checksum (4).
pub const HEADER_SIZE: usize = 8;

/// Largest payload that may be appended or read back.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

const OP_SET: u8 = 1;
const OP_DELETE: u8 = 2;

// == WAL Record ==
/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    Set { key: String, value: String },
    Delete { key: String },
}

impl WalRecord {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        WalRecord::Set {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        WalRecord::Delete { key: key.into() }
    }

    /// Returns the key the record mutates.
    pub fn key(&self) -> &str {
        match self {
            WalRecord::Set { key, .. } | WalRecord::Delete { key } => key,
        }
    }

    /// Size of the encoded payload, without the frame header.
    pub fn payload_len(&self) -> usize {
        match self {
            WalRecord::Set { key, value } => 1 + 4 + key.len() + 4 + value.len(),
            WalRecord::Delete { key } => 1 + 4 + key.len(),
        }
    }

    // == Encode ==
    /// Encodes the record as a complete frame, header included.
    ///
    /// Callers must check `payload_len` against `MAX_FRAME_SIZE` first; the
    /// length fields cannot represent larger payloads.
    pub fn encode(&self) -> Vec<u8> {
        let payload = self.encode_payload();
        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        frame.extend_from_slice(&payload);
        frame
    }

    fn encode_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.payload_len());
        match self {
            WalRecord::Set { key, value } => {
                payload.push(OP_SET);
                put_bytes(&mut payload, key.as_bytes());
                put_bytes(&mut payload, value.as_bytes());
            }
            WalRecord::Delete { key } => {
                payload.push(OP_DELETE);
                put_bytes(&mut payload, key.as_bytes());
            }
        }
        payload
    }

    // == Decode ==
    /// Decodes a payload whose checksum has already been verified.
    ///
    /// The whole payload must be consumed; trailing bytes are an error.
    pub fn decode_payload(payload: &[u8]) -> Result<Self, String> {
        let (&op, mut rest) = payload
            .split_first()
            .ok_or_else(|| "empty payload".to_string())?;

        let key = take_string(&mut rest, "key")?;
        let record = match op {
            OP_SET => {
                let value = take_string(&mut rest, "value")?;
                WalRecord::Set { key, value }
            }
            OP_DELETE => WalRecord::Delete { key },
            other => return Err(format!("unknown operation {}", other)),
        };

        if !rest.is_empty() {
            return Err(format!("{} trailing bytes in payload", rest.len()));
        }
        Ok(record)
    }
}

// == Frame Header ==
/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub len: u32,
    pub crc: u32,
}

impl FrameHeader {
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Self {
        let (len, crc) = bytes.split_at(4);
        Self {
            len: u32::from_le_bytes(len.try_into().unwrap_or_default()),
            crc: u32::from_le_bytes(crc.try_into().unwrap_or_default()),
        }
    }

    /// Returns true when `payload` hashes to the stored checksum.
    pub fn verify(&self, payload: &[u8]) -> bool {
        crc32fast::hash(payload) == self.crc
    }
}

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    buf.extend_from_slice(bytes);
}

fn take_string(rest: &mut &[u8], field: &str) -> Result<String, String> {
    if rest.len() < 4 {
        return Err(format!("missing {} length", field));
    }
    let (len_bytes, tail) = rest.split_at(4);
    let len = u32::from_le_bytes(len_bytes.try_into().unwrap_or_default()) as usize;
    if tail.len() < len {
        return Err(format!("{} shorter than declared length", field));
    }
    let (bytes, tail) = tail.split_at(len);
    *rest = tail;
    String::from_utf8(bytes.to_vec()).map_err(|_| format!("{} is not valid UTF-8", field))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn split_frame(frame: &[u8]) -> (FrameHeader, &[u8]) {
        let header: [u8; HEADER_SIZE] = frame[..HEADER_SIZE].try_into().unwrap();
        (FrameHeader::parse(&header), &frame[HEADER_SIZE..])
    }

    #[test]
    fn test_set_frame_layout() {
        let frame = WalRecord::set("a", "1").encode();
        let (header, payload) = split_frame(&frame);

        // op + key_len + "a" + value_len + "1"
        assert_eq!(header.len, 11);
        assert_eq!(payload.len(), 11);
        assert_eq!(payload[0], OP_SET);
        assert!(header.verify(payload));
        assert_eq!(
            WalRecord::decode_payload(payload).unwrap(),
            WalRecord::set("a", "1")
        );
    }

    #[test]
    fn test_payload_len_matches_encoding() {
        for record in [
            WalRecord::set("a", "1"),
            WalRecord::set("", ""),
            WalRecord::delete("key"),
        ] {
            assert_eq!(record.payload_len(), record.encode().len() - HEADER_SIZE);
        }
    }

    #[test]
    fn test_delete_frame_has_no_value() {
        let frame = WalRecord::delete("key").encode();
        let (header, payload) = split_frame(&frame);

        assert_eq!(header.len as usize, 1 + 4 + 3);
        assert_eq!(payload[0], OP_DELETE);
        assert_eq!(
            WalRecord::decode_payload(payload).unwrap(),
            WalRecord::delete("key")
        );
    }

    #[test]
    fn test_values_may_contain_separators() {
        let record = WalRecord::set("k|1\n", "v|with\nnewlines");
        let frame = record.encode();
        let (_, payload) = split_frame(&frame);
        assert_eq!(WalRecord::decode_payload(payload).unwrap(), record);
    }

    #[test]
    fn test_checksum_detects_flipped_byte() {
        let mut frame = WalRecord::set("key", "value").encode();
        let last = frame.len() - 1;
        frame[last] ^= 0xFF;

        let (header, payload) = split_frame(&frame);
        assert!(!header.verify(payload));
    }

    #[test]
    fn test_decode_rejects_unknown_op() {
        let mut payload = vec![9u8];
        put_bytes(&mut payload, b"key");
        let err = WalRecord::decode_payload(&payload).unwrap_err();
        assert!(err.contains("unknown operation"));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut payload = vec![OP_DELETE];
        put_bytes(&mut payload, b"key");
        payload.push(0);
        assert!(WalRecord::decode_payload(&payload).is_err());
    }

    #[test]
    fn test_decode_rejects_short_key() {
        let mut payload = vec![OP_DELETE];
        payload.extend_from_slice(&10u32.to_le_bytes());
        payload.extend_from_slice(b"abc");
        assert!(WalRecord::decode_payload(&payload).is_err());
    }

    #[test]
    fn test_decode_rejects_empty_payload() {
        assert!(WalRecord::decode_payload(&[]).is_err());
    }

    #[test]
    fn test_record_key() {
        assert_eq!(WalRecord::set("a", "1").key(), "a");
        assert_eq!(WalRecord::delete("b").key(), "b");
    }
}
