//! SSTable binary format: the 16-byte file prefix and the sparse directory.
//!
//! ```text
//! offset 0  : uint64 end_of_data_offset     (little-endian)
//! offset 8  : uint64 directory_length_bytes (little-endian)
//! offset 16 : payload region (variable)
//! offset end_of_data_offset : directory region (directory_length_bytes)
//! ```
//!
//! Directory record: `uint64 key_len | key | uint64 file_offset`, one per
//! sparse index anchor. `file_offset` points at the start of a payload entry
//! whose key is `>=` the sparse key.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::SSTableError;

/// Byte offset where the payload region begins. The first 16 bytes of every
/// SSTable file hold `[end_of_data_offset, directory_length_bytes]`.
pub const DATA_OFFSET: u64 = 16;

/// Writes the 16-byte prefix: `end_of_data_offset | directory_length_bytes`.
pub fn write_prefix<W: Write>(w: &mut W, end_of_data_offset: u64, directory_len: u64) -> io::Result<()> {
    w.write_u64::<LittleEndian>(end_of_data_offset)?;
    w.write_u64::<LittleEndian>(directory_len)?;
    Ok(())
}

/// Reads the 16-byte prefix, returning `(end_of_data_offset, directory_length_bytes)`.
pub fn read_prefix<R: Read>(r: &mut R) -> Result<(u64, u64), SSTableError> {
    let end_of_data_offset = r.read_u64::<LittleEndian>()?;
    let directory_len = r.read_u64::<LittleEndian>()?;
    if end_of_data_offset < DATA_OFFSET {
        return Err(SSTableError::Corrupt(format!(
            "end_of_data_offset {end_of_data_offset} is before the payload region (must be >= {DATA_OFFSET})"
        )));
    }
    Ok((end_of_data_offset, directory_len))
}

/// Writes one `(sparse_key, file_offset)` pair to the directory region.
pub fn write_directory_entry<W: Write>(w: &mut W, key: &[u8], file_offset: u64) -> io::Result<()> {
    w.write_u64::<LittleEndian>(key.len() as u64)?;
    w.write_all(key)?;
    w.write_u64::<LittleEndian>(file_offset)?;
    Ok(())
}

/// Decodes every `(sparse_key, file_offset)` pair out of a directory region
/// already read fully into memory.
pub fn decode_directory(buf: &[u8]) -> Result<Vec<(Vec<u8>, u64)>, SSTableError> {
    let mut cursor = buf;
    let mut out = Vec::new();
    while !cursor.is_empty() {
        let key_len = cursor.read_u64::<LittleEndian>()?;
        if key_len as usize > cursor.len() {
            return Err(SSTableError::Corrupt(format!(
                "directory key length {key_len} exceeds remaining directory bytes ({})",
                cursor.len()
            )));
        }
        let mut key = vec![0u8; key_len as usize];
        cursor.read_exact(&mut key)?;
        let file_offset = cursor.read_u64::<LittleEndian>()?;
        out.push((key, file_offset));
    }
    Ok(out)
}
