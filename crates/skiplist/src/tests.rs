use super::*;

// -------------------- Basic CRUD --------------------

#[test]
fn insert_then_get_returns_value() {
    let mut sl = SkipList::new(false);
    sl.insert(b"foo".to_vec(), b"bar".to_vec()).unwrap();
    assert_eq!(sl.get(b"foo"), Some(b"bar".as_slice()));
}

#[test]
fn get_missing_key_returns_none() {
    let sl = SkipList::new(false);
    assert_eq!(sl.get(b"missing"), None);
}

#[test]
fn insert_overwrites_existing_key() {
    let mut sl = SkipList::new(false);
    sl.insert(b"k".to_vec(), b"v1".to_vec()).unwrap();
    sl.insert(b"k".to_vec(), b"v2".to_vec()).unwrap();
    assert_eq!(sl.get(b"k"), Some(b"v2".as_slice()));
    assert_eq!(sl.len(), 1);
}

#[test]
fn delete_removes_key() {
    let mut sl = SkipList::new(false);
    sl.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
    assert!(sl.delete(b"k"));
    assert_eq!(sl.get(b"k"), None);
    assert!(sl.is_empty());
}

#[test]
fn delete_missing_key_is_a_no_op_not_an_error() {
    let mut sl = SkipList::new(false);
    assert!(!sl.delete(b"nope"));
    sl.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
    assert!(!sl.delete(b"also-nope"));
    // double-delete of an already-removed key is likewise a no-op
    assert!(sl.delete(b"k"));
    assert!(!sl.delete(b"k"));
}

#[test]
fn contains_key_reflects_presence() {
    let mut sl = SkipList::new(false);
    assert!(!sl.contains_key(b"k"));
    sl.insert(b"k".to_vec(), b"v".to_vec()).unwrap();
    assert!(sl.contains_key(b"k"));
    sl.delete(b"k");
    assert!(!sl.contains_key(b"k"));
}

// -------------------- Validation --------------------

#[test]
fn insert_rejects_empty_key() {
    let mut sl = SkipList::new(true);
    assert_eq!(sl.insert(Vec::new(), b"v".to_vec()), Err(SkipListError::EmptyKey));
}

#[test]
fn insert_rejects_empty_value_by_default() {
    let mut sl = SkipList::new(false);
    assert_eq!(sl.insert(b"k".to_vec(), Vec::new()), Err(SkipListError::EmptyValue));
}

#[test]
fn insert_permits_empty_value_when_configured() {
    let mut sl = SkipList::new(true);
    sl.insert(b"k".to_vec(), Vec::new()).unwrap();
    assert_eq!(sl.get(b"k"), Some(&b""[..]));
}

// -------------------- Ordering / iteration --------------------

#[test]
fn iter_yields_ascending_key_order() {
    let mut sl = SkipList::new(false);
    for k in ["banana", "apple", "cherry", "date"] {
        sl.insert(k.as_bytes().to_vec(), b"v".to_vec()).unwrap();
    }
    let keys: Vec<&[u8]> = sl.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"apple".as_slice(), b"banana", b"cherry", b"date"]);
}

#[test]
fn range_from_starts_at_first_key_gte_start() {
    let mut sl = SkipList::new(false);
    for k in ["a", "c", "e", "g", "i"] {
        sl.insert(k.as_bytes().to_vec(), b"v".to_vec()).unwrap();
    }
    let keys: Vec<&[u8]> = sl.range_from(b"d").map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"e".as_slice(), b"g", b"i"]);
}

#[test]
fn range_from_with_empty_start_is_full_scan() {
    let mut sl = SkipList::new(false);
    for k in ["z", "a", "m"] {
        sl.insert(k.as_bytes().to_vec(), b"v".to_vec()).unwrap();
    }
    let keys: Vec<&[u8]> = sl.range_from(b"").map(|(k, _)| k).collect();
    assert_eq!(keys, vec![b"a".as_slice(), b"m", b"z"]);
}

// -------------------- Clear / len / is_empty --------------------

#[test]
fn clear_resets_to_empty() {
    let mut sl = SkipList::new(false);
    for i in 0..50u32 {
        sl.insert(format!("key-{i:04}").into_bytes(), b"v".to_vec()).unwrap();
    }
    assert_eq!(sl.len(), 50);
    sl.clear();
    assert!(sl.is_empty());
    assert_eq!(sl.len(), 0);
    assert_eq!(sl.get(b"key-0000"), None);
    // arena is reusable after clear
    sl.insert(b"fresh".to_vec(), b"v".to_vec()).unwrap();
    assert_eq!(sl.get(b"fresh"), Some(b"v".as_slice()));
}

// -------------------- Stress --------------------

#[test]
fn many_inserts_preserve_order_and_lookup() {
    let mut sl = SkipList::new(false);
    let mut keys: Vec<String> = (0..5000).map(|i| format!("k{i:06}")).collect();
    for k in &keys {
        sl.insert(k.as_bytes().to_vec(), b"v".to_vec()).unwrap();
    }
    assert_eq!(sl.len(), keys.len());
    keys.sort();
    let got: Vec<String> = sl
        .iter()
        .map(|(k, _)| String::from_utf8(k.to_vec()).unwrap())
        .collect();
    assert_eq!(got, keys);
}

#[test]
fn interleaved_insert_and_delete_stress() {
    let mut sl = SkipList::new(false);
    for i in 0..2000u32 {
        sl.insert(format!("k{i:05}").into_bytes(), b"v".to_vec()).unwrap();
    }
    for i in (0..2000u32).step_by(2) {
        assert!(sl.delete(format!("k{i:05}").as_bytes()));
    }
    assert_eq!(sl.len(), 1000);
    for i in 0..2000u32 {
        let present = sl.contains_key(format!("k{i:05}").as_bytes());
        assert_eq!(present, i % 2 == 1);
    }
}

// -------------------- Edge cases --------------------

#[test]
fn binary_keys_and_values_round_trip() {
    let mut sl = SkipList::new(false);
    let key = vec![0u8, 1, 2, 255, 254, 0, 0];
    let value = vec![255u8, 0, 128];
    sl.insert(key.clone(), value.clone()).unwrap();
    assert_eq!(sl.get(&key), Some(value.as_slice()));
}

#[test]
fn large_value_round_trips() {
    let mut sl = SkipList::new(false);
    let value = vec![7u8; 1024 * 1024];
    sl.insert(b"big".to_vec(), value.clone()).unwrap();
    assert_eq!(sl.get(b"big"), Some(value.as_slice()));
}

#[test]
#[should_panic(expected = "NIL sentinel")]
fn mutating_nil_forward_pointer_panics() {
    let mut sl = SkipList::new(false);
    sl.set_forward(NIL, 0, HEADER);
}

#[test]
#[should_panic(expected = "sentinel node's value")]
fn mutating_header_value_panics() {
    let mut sl = SkipList::new(false);
    sl.set_value(HEADER, b"v".to_vec());
}
