use crate::*;
use skiplist::SkipList;
use tempfile::tempdir;

fn sample_memtable() -> SkipList {
    let mut m = SkipList::new(false);
    m.insert(b"a".to_vec(), b"apple".to_vec()).unwrap();
    m.insert(b"b".to_vec(), b"banana".to_vec()).unwrap();
    m.insert(b"c".to_vec(), b"cherry".to_vec()).unwrap();
    m
}

#[test]
fn write_empty_skiplists_produces_header_only_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.sst");
    let mem = SkipList::new(false);
    let tomb = SkipList::new(true);

    SSTableWriter::write(&path, &mem, &tomb).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), 16, "an empty flush should produce exactly the 16-byte prefix");
    let end_of_data = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let dir_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert_eq!(end_of_data, 16);
    assert_eq!(dir_len, 0);
}

#[test]
fn write_merges_memtable_and_tombstones_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("merged.sst");

    let mem = sample_memtable();
    let mut tomb = SkipList::new(true);
    tomb.insert(b"ab".to_vec(), Vec::new()).unwrap();
    tomb.insert(b"d".to_vec(), Vec::new()).unwrap();

    SSTableWriter::write(&path, &mem, &tomb).unwrap();
    let reader = SSTableReader::open(&path).unwrap();

    assert_eq!(reader.get(b"a").unwrap(), Some(b"apple".to_vec()));
    assert_eq!(reader.get(b"ab").unwrap(), None, "tombstoned key must read as absent");
    assert_eq!(reader.get(b"b").unwrap(), Some(b"banana".to_vec()));
    assert_eq!(reader.get(b"c").unwrap(), Some(b"cherry".to_vec()));
    assert_eq!(reader.get(b"d").unwrap(), None);
}

#[test]
fn write_rejects_key_present_in_both_sources() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conflict.sst");

    let mut mem = SkipList::new(false);
    mem.insert(b"dup".to_vec(), b"v".to_vec()).unwrap();
    let mut tomb = SkipList::new(true);
    tomb.insert(b"dup".to_vec(), Vec::new()).unwrap();

    let err = SSTableWriter::write(&path, &mem, &tomb).unwrap_err();
    assert!(matches!(err, SSTableError::InvariantViolation(k) if k == b"dup"));
    assert!(!path.exists(), "a failed flush must not publish a file at the target path");
}

#[test]
fn sparse_index_threshold_forces_multiple_directory_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sparse.sst");

    let mut mem = SkipList::new(false);
    for i in 0..50u32 {
        let key = format!("key-{i:04}").into_bytes();
        let value = vec![b'x'; 40];
        mem.insert(key, value).unwrap();
    }
    let tomb = SkipList::new(true);

    SSTableWriter::write_with_threshold(&path, &mem, &tomb, 64).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let end_of_data = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let dir_len = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
    assert!(dir_len > 0, "a small threshold over 50 entries must produce directory anchors");
    assert_eq!(bytes.len() as u64, end_of_data + dir_len);

    let reader = SSTableReader::open(&path).unwrap();
    for i in 0..50u32 {
        let key = format!("key-{i:04}").into_bytes();
        assert_eq!(reader.get(&key).unwrap(), Some(vec![b'x'; 40]));
    }
}

#[test]
fn only_memtable_nonempty_degenerates_to_a_copy() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mem_only.sst");
    let mem = sample_memtable();
    let tomb = SkipList::new(true);

    SSTableWriter::write(&path, &mem, &tomb).unwrap();
    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(reader.get(b"a").unwrap(), Some(b"apple".to_vec()));
    assert_eq!(reader.get(b"b").unwrap(), Some(b"banana".to_vec()));
    assert_eq!(reader.get(b"c").unwrap(), Some(b"cherry".to_vec()));
}

#[test]
fn only_tombstones_nonempty_writes_only_tombstone_entries() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tomb_only.sst");
    let mem = SkipList::new(false);
    let mut tomb = SkipList::new(true);
    tomb.insert(b"gone".to_vec(), Vec::new()).unwrap();

    SSTableWriter::write(&path, &mem, &tomb).unwrap();
    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(reader.get(b"gone").unwrap(), None);
    assert!(!reader.has(b"gone").unwrap());
}
