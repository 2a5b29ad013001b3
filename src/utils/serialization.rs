//! Length-prefixed wire helpers: every variable-length field is written as a
//! 4-byte big-endian length followed by the field bytes, in a fixed order.
//! Raw fields (fixed-width digests) are appended without a prefix.

use crate::constants::SCALAR_NUM_BYTES;
use crate::error::MosaicError;

pub(crate) struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    pub fn new() -> Self {
        FieldWriter { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        FieldWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn put_block(&mut self, bytes: &[u8]) {
        self.buf
            .extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub(crate) struct FieldReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        FieldReader { bytes, pos: 0 }
    }

    /// Reads the next length-prefixed block.
    pub fn next_block(&mut self) -> Result<&'a [u8], MosaicError> {
        let header = self
            .bytes
            .get(self.pos..self.pos + 4)
            .ok_or(MosaicError::Serialization("truncated length prefix"))?;
        let len = u32::from_be_bytes(header.try_into().expect("4-byte slice")) as usize;
        self.pos += 4;
        self.take_raw(len)
    }

    /// Reads `len` raw bytes.
    pub fn take_raw(&mut self, len: usize) -> Result<&'a [u8], MosaicError> {
        let field = self
            .bytes
            .get(self.pos..self.pos + len)
            .ok_or(MosaicError::Serialization("truncated field"))?;
        self.pos += len;
        Ok(field)
    }

    /// Fails unless the whole input was consumed.
    pub fn finish(self) -> Result<(), MosaicError> {
        if self.pos != self.bytes.len() {
            return Err(MosaicError::Serialization("trailing bytes"));
        }
        Ok(())
    }
}

/// ℤ_q scalars as 32-bit little-endian words.
pub(crate) fn scalars_to_bytes(scalars: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(scalars.len() * SCALAR_NUM_BYTES);
    for s in scalars {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Parses exactly `expected_len` scalars and range-checks them against `q`.
pub(crate) fn scalars_from_bytes(
    bytes: &[u8],
    expected_len: usize,
    q: u32,
) -> Result<Vec<u32>, MosaicError> {
    if bytes.len() != expected_len * SCALAR_NUM_BYTES {
        return Err(MosaicError::Serialization("scalar vector length mismatch"));
    }
    let mut out = Vec::with_capacity(expected_len);
    for chunk in bytes.chunks_exact(SCALAR_NUM_BYTES) {
        let s = u32::from_le_bytes(chunk.try_into().expect("4-byte chunk"));
        if s >= q {
            return Err(MosaicError::Serialization("scalar out of range"));
        }
        out.push(s);
    }
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blocks_round_trip_in_order() {
        let mut w = FieldWriter::new();
        w.put_block(b"first");
        w.put_block(b"");
        w.put_block(b"third");
        w.put_raw(&[0xff; 4]);
        let bytes = w.into_bytes();

        let mut r = FieldReader::new(&bytes);
        assert_eq!(r.next_block().unwrap(), b"first");
        assert_eq!(r.next_block().unwrap(), b"");
        assert_eq!(r.next_block().unwrap(), b"third");
        assert_eq!(r.take_raw(4).unwrap(), &[0xff; 4]);
        r.finish().unwrap();
    }

    #[test]
    fn truncated_inputs_fail() {
        let mut w = FieldWriter::new();
        w.put_block(b"payload");
        let bytes = w.into_bytes();

        // Cut inside the length prefix.
        let mut r = FieldReader::new(&bytes[..2]);
        assert!(r.next_block().is_err());

        // Cut inside the field body.
        let mut r = FieldReader::new(&bytes[..bytes.len() - 1]);
        assert!(r.next_block().is_err());
    }

    #[test]
    fn oversized_length_prefix_fails() {
        let mut bytes = u32::MAX.to_be_bytes().to_vec();
        bytes.extend_from_slice(b"short");
        let mut r = FieldReader::new(&bytes);
        assert!(r.next_block().is_err());
    }

    #[test]
    fn trailing_bytes_fail() {
        let mut w = FieldWriter::new();
        w.put_block(b"x");
        let mut bytes = w.into_bytes();
        bytes.push(0);

        let mut r = FieldReader::new(&bytes);
        r.next_block().unwrap();
        assert!(r.finish().is_err());
    }

    #[test]
    fn scalar_codec_checks_range() {
        let q = 7681;
        let v = vec![0u32, 1, q - 1];
        let bytes = scalars_to_bytes(&v);
        assert_eq!(scalars_from_bytes(&bytes, 3, q).unwrap(), v);

        let bad = scalars_to_bytes(&[q]);
        assert!(scalars_from_bytes(&bad, 1, q).is_err());
        assert!(scalars_from_bytes(&bytes, 2, q).is_err());
    }
}
