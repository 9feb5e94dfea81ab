use codec::Entry;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::format::{decode_directory, read_prefix, DATA_OFFSET};
use crate::SSTableError;

/// Result of [`SSTableReader::lookup`] — distinguishes a tombstoned key from
/// one that was never written to this file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The key has a live value.
    Found(Vec<u8>),
    /// The key was tombstoned in this SSTable.
    Tombstone,
    /// The key does not appear in this SSTable at all.
    Absent,
}

/// Reads an immutable SSTable file for point lookups and range scans.
///
/// [`open`](SSTableReader::open) loads the sparse directory into memory (it
/// is small by construction — one entry per ~1 KiB of payload) and keeps a
/// single file handle open for the reader's lifetime, guarded by a `Mutex`
/// so `&self` methods can seek and read without requiring `&mut self`.
pub struct SSTableReader {
    #[allow(dead_code)]
    path: PathBuf,
    directory: Vec<(Vec<u8>, u64)>,
    end_of_data_offset: u64,
    file: Mutex<BufReader<File>>,
}

impl SSTableReader {
    /// Opens `path`, reading the 16-byte prefix and the full directory.
    ///
    /// # Errors
    ///
    /// [`SSTableError::Corrupt`] if the prefix is malformed (e.g.
    /// `end_of_data_offset` before the payload region) or the directory
    /// bytes don't decode cleanly. [`SSTableError::Io`] on any underlying
    /// file failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SSTableError> {
        let path_buf = path.as_ref().to_path_buf();
        let mut f = File::open(&path_buf)?;

        let (end_of_data_offset, directory_len) = read_prefix(&mut f)?;

        let directory = if directory_len == 0 {
            Vec::new()
        } else {
            f.seek(SeekFrom::Start(end_of_data_offset))?;
            let mut buf = vec![0u8; directory_len as usize];
            f.read_exact(&mut buf)?;
            decode_directory(&buf)?
        };

        f.seek(SeekFrom::Start(DATA_OFFSET))?;

        Ok(Self {
            path: path_buf,
            directory,
            end_of_data_offset,
            file: Mutex::new(BufReader::new(f)),
        })
    }

    /// Finds the largest directory offset whose sparse key is `<= key`, or
    /// [`DATA_OFFSET`] if the directory is empty or every sparse key is
    /// greater than `key`.
    fn scan_start_offset(&self, key: &[u8]) -> u64 {
        match self.directory.partition_point(|(k, _)| k.as_slice() <= key) {
            0 => DATA_OFFSET,
            n => self.directory[n - 1].1,
        }
    }

    /// Looks up `key`. Returns `Ok(None)` if the key is absent or its
    /// on-disk entry is a tombstone (zero-length value).
    ///
    /// This collapses "absent" and "tombstoned" the way the spec's
    /// single-table `get` contract requires. A caller that needs to tell
    /// the two apart — e.g. an engine falling through several sealed
    /// SSTables, where a tombstone in a newer file must shadow a live value
    /// in an older one rather than being skipped past — should use
    /// [`lookup`](Self::lookup) instead.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, SSTableError> {
        Ok(match self.lookup(key)? {
            Lookup::Found(value) => Some(value),
            Lookup::Tombstone | Lookup::Absent => None,
        })
    }

    /// Looks up `key`, distinguishing a tombstone from plain absence.
    pub fn lookup(&self, key: &[u8]) -> Result<Lookup, SSTableError> {
        let start = self.scan_start_offset(key);
        let mut f = self.file.lock().expect("sstable file mutex poisoned");
        f.seek(SeekFrom::Start(start))?;

        loop {
            if f.stream_position()? >= self.end_of_data_offset {
                return Ok(Lookup::Absent);
            }
            let (entry, _) = Entry::decode(&mut *f)?;
            match entry.key.as_slice().cmp(key) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => {
                    return Ok(if entry.is_tombstone() {
                        Lookup::Tombstone
                    } else {
                        Lookup::Found(entry.value)
                    });
                }
                std::cmp::Ordering::Greater => return Ok(Lookup::Absent),
            }
        }
    }

    /// `true` if `get(key)` would return a value.
    pub fn has(&self, key: &[u8]) -> Result<bool, SSTableError> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns an iterator over live (non-tombstoned) entries with
    /// `start <= key <= limit`, in ascending key order.
    ///
    /// Scans toward `start` via the directory exactly as [`get`](Self::get)
    /// does, then rewinds to the first entry whose key is `>= start` so the
    /// iterator's first `next()` returns it.
    pub fn range_scan(&self, start: &[u8], limit: &[u8]) -> Result<RangeScanIter<'_>, SSTableError> {
        let scan_start = self.scan_start_offset(start);
        let mut f = self.file.lock().expect("sstable file mutex poisoned");
        f.seek(SeekFrom::Start(scan_start))?;

        loop {
            if f.stream_position()? >= self.end_of_data_offset {
                break;
            }
            let pos_before = f.stream_position()?;
            let (entry, _) = Entry::decode(&mut *f)?;
            if entry.key.as_slice() >= start {
                f.seek(SeekFrom::Start(pos_before))?;
                break;
            }
        }
        drop(f);

        Ok(RangeScanIter {
            reader: self,
            limit: limit.to_vec(),
            done: false,
            error: None,
        })
    }
}

/// Forward iterator over live entries, produced by [`SSTableReader::range_scan`].
///
/// Implements [`Iterator`] for idiomatic `for`-loop use; a failed read
/// terminates iteration (yields `None`) and leaves the failure in
/// [`error`](Self::error), matching the spec's "subsequent `next()` after an
/// error returns false" contract without a separate non-standard iterator
/// type.
pub struct RangeScanIter<'a> {
    reader: &'a SSTableReader,
    limit: Vec<u8>,
    done: bool,
    error: Option<SSTableError>,
}

impl<'a> RangeScanIter<'a> {
    /// The error that terminated iteration early, if any. `None` if the scan
    /// is still in progress or ran to completion cleanly.
    pub fn error(&self) -> Option<&SSTableError> {
        self.error.as_ref()
    }
}

impl<'a> Iterator for RangeScanIter<'a> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let mut f = self.reader.file.lock().expect("sstable file mutex poisoned");
            let pos = match f.stream_position() {
                Ok(p) => p,
                Err(e) => {
                    self.error = Some(e.into());
                    self.done = true;
                    return None;
                }
            };
            if pos >= self.reader.end_of_data_offset {
                self.done = true;
                return None;
            }
            let entry = match Entry::decode(&mut *f) {
                Ok((entry, _)) => entry,
                Err(e) => {
                    self.error = Some(e.into());
                    self.done = true;
                    return None;
                }
            };
            drop(f);

            if entry.key.as_slice() > self.limit.as_slice() {
                self.done = true;
                return None;
            }
            if entry.is_tombstone() {
                continue;
            }
            return Some((entry.key, entry.value));
        }
    }
}
