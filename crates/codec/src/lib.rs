//! # codec — on-disk and on-wire binary encodings
//!
//! Two related but distinct encodings live here:
//!
//! * [`Entry`] — a `(key, value)` pair as stored inside an SSTable payload.
//!   A zero-length value denotes a tombstone.
//! * [`DbOperation`] — a WAL record: a `Put` or `Delete` mutation, framed
//!   with a leading total-length so a reader can tell where one record ends
//!   and the next begins without scanning for a delimiter.
//!
//! Both are little-endian, both use `u64` length prefixes throughout, and
//! neither carries a checksum — integrity is the caller's concern (the WAL
//! and SSTable writers rely on atomic file operations rather than per-record
//! CRCs).
//!
//! ```text
//! Entry:        key_len(u64) | key | value_len(u64) | [value]
//! DbOperation:  total_len(u64) | opcode(u8) | key_len(u64) | key | [value_len(u64) | value]
//! ```
//!
//! `total_len` counts every byte from `opcode` through the end of `value` —
//! it does not include itself.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors raised while encoding or decoding a record.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The bytes read do not form a well-formed record.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Opcode {
    Put = 1,
    Delete = 2,
}

impl Opcode {
    fn includes_value(self) -> bool {
        matches!(self, Opcode::Put)
    }

    fn from_u8(b: u8) -> Result<Self, CodecError> {
        match b {
            1 => Ok(Opcode::Put),
            2 => Ok(Opcode::Delete),
            other => Err(CodecError::Corrupt(format!("unknown opcode {other}"))),
        }
    }
}

/// A `(key, value)` pair as it appears inside an SSTable payload region. A
/// zero-length `value` means `key` was tombstoned at flush time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl Entry {
    /// `true` if this entry represents a deletion rather than a live value.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_empty()
    }

    /// Writes `key_len | key | value_len | [value]` to `w`.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        w.write_u64::<LittleEndian>(self.key.len() as u64)?;
        w.write_all(&self.key)?;
        w.write_u64::<LittleEndian>(self.value.len() as u64)?;
        if !self.value.is_empty() {
            w.write_all(&self.value)?;
        }
        Ok(())
    }

    /// Decodes one entry from `r`, also returning the number of bytes
    /// consumed. Range scans use the byte count to rewind the stream back to
    /// the start of an entry once they find the first key `>= start`.
    pub fn decode<R: Read>(r: &mut R) -> Result<(Entry, u64), CodecError> {
        let mut consumed = 0u64;

        let key_len = r.read_u64::<LittleEndian>()?;
        consumed += 8;
        let key = read_exact_vec(r, key_len)?;
        consumed += key_len;

        let value_len = r.read_u64::<LittleEndian>()?;
        consumed += 8;
        let value = if value_len == 0 {
            Vec::new()
        } else {
            let v = read_exact_vec(r, value_len)?;
            consumed += value_len;
            v
        };

        Ok((Entry { key, value }, consumed))
    }
}

/// A single WAL mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbOperation {
    /// A key-value insertion.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// A key deletion.
    Delete { key: Vec<u8> },
}

impl DbOperation {
    fn opcode(&self) -> Opcode {
        match self {
            DbOperation::Put { .. } => Opcode::Put,
            DbOperation::Delete { .. } => Opcode::Delete,
        }
    }

    fn key(&self) -> &[u8] {
        match self {
            DbOperation::Put { key, .. } | DbOperation::Delete { key } => key,
        }
    }

    /// Encodes the full WAL record.
    ///
    /// `total_len` covers every byte from `opcode` through the end of
    /// `value` (or through the key, for a `Delete`) — it does **not**
    /// include the 8 bytes of `total_len` itself.
    pub fn encode<W: Write>(&self, w: &mut W) -> Result<(), CodecError> {
        let key = self.key();
        let mut total_len = 1u64 + 8 + key.len() as u64;
        if let DbOperation::Put { value, .. } = self {
            total_len += 8 + value.len() as u64;
        }

        w.write_u64::<LittleEndian>(total_len)?;
        w.write_u8(self.opcode() as u8)?;
        w.write_u64::<LittleEndian>(key.len() as u64)?;
        w.write_all(key)?;
        if let DbOperation::Put { value, .. } = self {
            w.write_u64::<LittleEndian>(value.len() as u64)?;
            w.write_all(value)?;
        }
        Ok(())
    }

    /// Decodes one WAL record from `r`.
    ///
    /// Returns `Ok(None)` on a clean EOF, and treats a truncated trailing
    /// record (a crash mid-append leaving a partial `total_len` or body) the
    /// same way — both are normal termination, not corruption. A record that
    /// reads in full but fails structurally (bad opcode, an inner length
    /// field pointing past the end of the record) is `CodecError::Corrupt`.
    pub fn decode<R: Read>(r: &mut R) -> Result<Option<DbOperation>, CodecError> {
        let total_len = match r.read_u64::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if total_len < 1 + 8 {
            return Err(CodecError::Corrupt(format!(
                "record length {total_len} too small to hold an opcode and key length"
            )));
        }

        let mut body = vec![0u8; total_len as usize];
        if let Err(e) = r.read_exact(&mut body) {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                return Ok(None);
            }
            return Err(e.into());
        }

        let mut cursor = &body[..];
        let opcode = Opcode::from_u8(cursor.read_u8()?)?;
        let key_len = cursor.read_u64::<LittleEndian>()?;
        if key_len > cursor.len() as u64 {
            return Err(CodecError::Corrupt(format!(
                "key length {key_len} exceeds remaining record bytes ({})",
                cursor.len()
            )));
        }
        let key = read_exact_vec(&mut cursor, key_len)?;

        let op = if opcode.includes_value() {
            let value_len = cursor.read_u64::<LittleEndian>()?;
            if value_len > cursor.len() as u64 {
                return Err(CodecError::Corrupt(format!(
                    "value length {value_len} exceeds remaining record bytes ({})",
                    cursor.len()
                )));
            }
            let value = read_exact_vec(&mut cursor, value_len)?;
            DbOperation::Put { key, value }
        } else {
            DbOperation::Delete { key }
        };

        Ok(Some(op))
    }
}

fn read_exact_vec<R: Read>(r: &mut R, len: u64) -> Result<Vec<u8>, CodecError> {
    // Sanity cap, well above any realistic key/value — guards against a
    // corrupt length field driving an enormous allocation.
    const MAX_ALLOC: u64 = 1 << 32;
    if len > MAX_ALLOC {
        return Err(CodecError::Corrupt(format!("implausible length {len}")));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf)?;
    Ok(buf)
}
