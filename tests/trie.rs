//! End-to-end scenarios and invariant checks against the public `Trie` API.

use patricia_forest::{KeyOf, Trie};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    key: Vec<u8>,
    tag: u32,
}

impl Entry {
    fn new(key: &[u8], tag: u32) -> Self {
        Entry { key: key.to_vec(), tag }
    }
}

impl KeyOf for Entry {
    fn key(&self) -> &[u8] {
        &self.key
    }
}

fn keys_of<'a>(trie: &'a Trie<Entry, 7>) -> Vec<Vec<u8>> {
    trie.iter().map(|e| e.key.clone()).collect()
}

#[test]
fn s1_nested_prefixes_iterate_and_size_correctly() {
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(b"a", 1)).unwrap();
    t.add(Entry::new(b"ab", 2)).unwrap();
    t.add(Entry::new(b"abc", 3)).unwrap();

    assert_eq!(keys_of(&t), vec![b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]);
    assert_eq!(t.get(b"ab").unwrap().tag, 2);
    assert_eq!(t.prefix(b"a").size(), 3);
    assert_eq!(t.prefix(b"ab").size(), 2);
}

#[test]
fn s2_disjoint_and_overlapping_prefixes() {
    let mut t: Trie<Entry, 7> = Trie::new();
    for (k, tag) in [(b"foo".as_slice(), 1), (b"bar", 2), (b"baz", 3), (b"barber", 4)] {
        t.add(Entry::new(k, tag)).unwrap();
    }
    assert_eq!(
        keys_of(&t),
        vec![b"bar".to_vec(), b"barber".to_vec(), b"baz".to_vec(), b"foo".to_vec()]
    );
    assert_eq!(t.prefix(b"bar").size(), 2);
}

#[test]
fn s3_overflow_beyond_capacity_forces_a_split_but_stays_searchable() {
    // B = 7: insert B+2 = 9 keys that share a long common byte prefix so
    // they all land deep in the same subtree before diverging.
    let mut t: Trie<Entry, 7> = Trie::new();
    let keys: Vec<String> = (0..=8u8).map(|n| format!("a{n}")).collect();
    for (i, k) in keys.iter().enumerate() {
        assert!(t.add(Entry::new(k.as_bytes(), i as u32)).unwrap());
    }
    assert_eq!(t.len(), keys.len());
    for k in &keys {
        assert!(t.get(k.as_bytes()).is_some(), "missing {k}");
    }
    assert!(t.stats().tree_count > 1, "expected at least one split");
}

#[test]
fn s4_put_ejects_previous_value() {
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(b"abc", 1)).unwrap();
    let ejected = t.put(Entry::new(b"abc", 2)).unwrap();
    assert_eq!(ejected, Some(Entry::new(b"abc", 1)));
    assert_eq!(t.get(b"abc").unwrap().tag, 2);
}

#[test]
fn s5_policy_put_can_reject_a_replacement() {
    use patricia_forest::PolicyEject;
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(b"abc", 1)).unwrap();
    let eject = t.policy_put(Entry::new(b"abc", 2), |_existing, _new| false).unwrap();
    match eject {
        PolicyEject::Rejected(v) => assert_eq!(v.tag, 2),
        other => panic!("expected Rejected, got {other:?}"),
    }
    assert_eq!(t.get(b"abc").unwrap().tag, 1, "original value unchanged");
}

#[test]
fn s6_remove_leaves_sibling_reachable_then_trie_goes_idle() {
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(b"abc", 1)).unwrap();
    t.add(Entry::new(b"abd", 2)).unwrap();

    assert_eq!(t.remove(b"abd").unwrap().map(|e| e.tag), Some(2));
    assert!(t.get(b"abd").is_none());
    assert_eq!(t.get(b"abc").unwrap().tag, 1);

    assert_eq!(t.remove(b"abc").unwrap().map(|e| e.tag), Some(1));
    assert!(t.is_empty());
}

#[test]
fn empty_key_is_admissible_and_sorts_first() {
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(b"", 0)).unwrap();
    t.add(Entry::new(b"a", 1)).unwrap();
    t.add(Entry::new(b"b", 2)).unwrap();
    assert_eq!(keys_of(&t)[0], Vec::<u8>::new());
    assert_eq!(t.get(b"").unwrap().tag, 0);
}

#[test]
fn all_single_byte_values_coexist() {
    let mut t: Trie<Entry, 7> = Trie::new();
    for b in 0u16..=255 {
        t.add(Entry::new(&[b as u8], b as u32)).unwrap();
    }
    assert_eq!(t.len(), 256);
    for b in 0u16..=255 {
        assert_eq!(t.get(&[b as u8]).unwrap().tag, b as u32);
    }
    let out = keys_of(&t);
    let mut sorted = out.clone();
    sorted.sort();
    assert_eq!(out, sorted, "iteration must be in bytewise ascending order");
}

#[test]
fn keys_differing_only_in_a_deep_bit_are_distinguished() {
    // Two 2-byte keys agreeing on every bit except the 7th-from-last
    // (bit index 9 of 16, 0-indexed from the most significant bit).
    let a = [0b0000_0000u8, 0b0000_0010];
    let b = [0b0000_0000u8, 0b0000_0000];
    let mut t: Trie<Entry, 7> = Trie::new();
    t.add(Entry::new(&a, 1)).unwrap();
    t.add(Entry::new(&b, 2)).unwrap();
    assert_eq!(t.get(&a).unwrap().tag, 1);
    assert_eq!(t.get(&b).unwrap().tag, 2);
}

#[test]
fn p7_add_then_remove_all_in_any_order_leaves_trie_idle() {
    let mut t: Trie<Entry, 3> = Trie::new();
    let keys: Vec<String> = (0..40u32).map(|i| format!("item-{i}")).collect();
    for (i, k) in keys.iter().enumerate() {
        assert!(t.add(Entry::new(k.as_bytes(), i as u32)).unwrap());
    }
    assert_eq!(t.len(), keys.len());

    // Remove in a different order than insertion.
    let mut removal_order: Vec<&String> = keys.iter().collect();
    removal_order.sort_by_key(|k| k.len().wrapping_mul(31) ^ k.as_bytes()[k.len() - 1] as usize);
    for k in removal_order {
        assert!(t.remove(k.as_bytes()).unwrap().is_some());
    }
    assert!(t.is_empty());
    assert_eq!(t.len(), 0);
}

#[test]
fn p8_prefix_size_law_over_first_byte_partition() {
    let mut t: Trie<Entry, 7> = Trie::new();
    let words = ["apple", "ant", "bee", "bear", "cat"];
    for (i, w) in words.iter().enumerate() {
        t.add(Entry::new(w.as_bytes(), i as u32)).unwrap();
    }
    let total = t.prefix(b"").size();
    assert_eq!(total, words.len());

    let mut sum = 0;
    for c in b'a'..=b'z' {
        sum += t.prefix(&[c]).size();
    }
    assert_eq!(sum, total);
}

#[test]
fn p4_and_p9_iterator_values_round_trip_through_get() {
    let mut t: Trie<Entry, 7> = Trie::new();
    let words = ["zebra", "apple", "mango", "kiwi", "banana"];
    for (i, w) in words.iter().enumerate() {
        t.add(Entry::new(w.as_bytes(), i as u32)).unwrap();
    }
    let iterated: Vec<&Entry> = t.iter().collect();
    assert_eq!(iterated.len(), words.len());
    for entry in iterated.iter() {
        assert_eq!(t.get(&entry.key), Some(*entry));
    }
    let mut sorted_keys: Vec<_> = iterated.iter().map(|e| e.key.clone()).collect();
    let mut expected: Vec<_> = words.iter().map(|w| w.as_bytes().to_vec()).collect();
    expected.sort();
    sorted_keys.sort();
    assert_eq!(sorted_keys, expected);
    // Confirm the unsorted iteration was already ascending.
    let direct: Vec<_> = t.iter().map(|e| e.key.clone()).collect();
    assert_eq!(direct, expected);
}
