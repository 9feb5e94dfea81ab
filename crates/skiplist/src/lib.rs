//! # SkipList — probabilistic ordered map
//!
//! A skip list is a linked structure with multiple "lanes": level 1 touches
//! every node, and each higher level skips over roughly half of the nodes in
//! the level below it. Searching starts at the highest lane and drops down a
//! level each time the next node would overshoot the target key, giving
//! `O(log n)` expected search, insert, and delete without the rebalancing a
//! tree would need. See Pugh, "Skip Lists: A Probabilistic Alternative to
//! Balanced Trees" (1990).
//!
//! ```text
//! level 4  H ----------------------------------------> NIL
//! level 3  H --------> C -------------------> K -----> NIL
//! level 2  H --------> C --------> G -------> K -----> NIL
//! level 1  H -> A -> C -> E -> G -> I -> K -> M -> ---> NIL
//! ```
//!
//! `H` (header) sorts before every real key; `NIL` sorts after every real
//! key. Every node's forward pointer array is terminated by `NIL`, so a
//! traversal never needs to check for a null pointer — it checks for `NIL`
//! the same way it checks any other node.
//!
//! Nodes live in an arena (`Vec<Node>`) addressed by `NodeId`, not as
//! separately-allocated, individually-owned linked nodes. This sidesteps the
//! ownership puzzle an intrusive linked structure would pose in safe Rust: a
//! `Vec` index is `Copy`, requires no lifetime, and the arena itself owns
//! every node outright.

use rand::Rng;
use std::cmp::Ordering;
use thiserror::Error;

/// Highest level a node may reach. Matches the reference implementation this
/// crate is modeled on; 16 levels comfortably covers lists with up to ~2^16
/// entries at `p = 0.5` without meaningfully increasing search cost for
/// smaller lists.
pub const MAX_LEVEL: usize = 16;

/// Probability a node promoted to level `i` is also promoted to level `i+1`.
const P: f32 = 0.5;

/// Errors returned by mutating [`SkipList`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SkipListError {
    /// `insert` was called with an empty key. Keys must always be non-empty.
    #[error("key must not be empty")]
    EmptyKey,
    /// `insert` was called with an empty value on a list that does not
    /// permit them.
    #[error("value must not be empty")]
    EmptyValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

/// The header sentinel. Always arena slot 0; compares less than any key.
const HEADER: NodeId = NodeId(0);
/// The NIL sentinel. Always arena slot 1; compares greater than any key.
/// Singleton for the lifetime of a list — mutating it is a programming error.
const NIL: NodeId = NodeId(1);

enum NodeKind {
    Header,
    Nil,
    Value { key: Vec<u8>, value: Vec<u8> },
}

struct Node {
    kind: NodeKind,
    forward: [NodeId; MAX_LEVEL],
}

/// An ordered map from byte-string keys to byte-string values, implemented
/// as a probabilistic skip list.
///
/// Two independent `SkipList` instances back each storage engine: one for
/// live entries and one for tombstones. A `SkipList` does not know about
/// that split — it just enforces, per-instance, whether an empty value is a
/// valid insert (`allow_empty_value`), so the tombstone list can represent a
/// deletion marker while the live list cannot mistake a deletion marker for
/// real data.
pub struct SkipList {
    allow_empty_value: bool,
    nodes: Vec<Node>,
    level: usize,
    len: usize,
}

impl SkipList {
    /// Creates an empty skip list.
    ///
    /// `allow_empty_value` controls whether `insert` accepts a zero-length
    /// value; pass `true` only for a tombstone set.
    pub fn new(allow_empty_value: bool) -> Self {
        let header = Node {
            kind: NodeKind::Header,
            forward: [NIL; MAX_LEVEL],
        };
        let nil = Node {
            kind: NodeKind::Nil,
            forward: [NIL; MAX_LEVEL],
        };
        Self {
            allow_empty_value,
            nodes: vec![header, nil],
            level: 1,
            len: 0,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` if the list holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Looks up `key`, returning its value if present.
    #[must_use]
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let mut current = HEADER;
        for lvl in (0..self.level).rev() {
            while self.cmp_key(self.forward(current, lvl), key) == Ordering::Less {
                current = self.forward(current, lvl);
            }
        }
        let candidate = self.forward(current, 0);
        match &self.node(candidate).kind {
            NodeKind::Value { key: k, value } if k.as_slice() == key => Some(value.as_slice()),
            _ => None,
        }
    }

    /// `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or overwrites `key` with `value`.
    ///
    /// Returns [`SkipListError::EmptyKey`] if `key` is empty, or
    /// [`SkipListError::EmptyValue`] if `value` is empty and this list was
    /// not constructed with `allow_empty_value`.
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), SkipListError> {
        if key.is_empty() {
            return Err(SkipListError::EmptyKey);
        }
        if value.is_empty() && !self.allow_empty_value {
            return Err(SkipListError::EmptyValue);
        }

        let mut update = [HEADER; MAX_LEVEL];
        let mut current = HEADER;
        for lvl in (0..self.level).rev() {
            while self.cmp_key(self.forward(current, lvl), &key) == Ordering::Less {
                current = self.forward(current, lvl);
            }
            update[lvl] = current;
        }

        let candidate = self.forward(current, 0);
        if self.cmp_key(candidate, &key) == Ordering::Equal {
            self.set_value(candidate, value);
            return Ok(());
        }

        let insertion_level = self.random_level();
        if insertion_level > self.level {
            for lvl in self.level..insertion_level {
                update[lvl] = HEADER;
            }
            self.level = insertion_level;
        }

        let new_id = self.push_value_node(key, value);
        for lvl in 0..insertion_level {
            let next = self.forward(update[lvl], lvl);
            self.set_forward(new_id, lvl, next);
            self.set_forward(update[lvl], lvl, new_id);
        }
        self.len += 1;
        Ok(())
    }

    /// Removes `key` if present. Returns `true` if a node was removed.
    ///
    /// Deleting a key that is not present is a no-op, not an error — the
    /// caller cannot distinguish "never existed" from "already deleted",
    /// and single-threaded callers never need to.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let mut update = [HEADER; MAX_LEVEL];
        let mut current = HEADER;
        for lvl in (0..self.level).rev() {
            while self.cmp_key(self.forward(current, lvl), key) == Ordering::Less {
                current = self.forward(current, lvl);
            }
            update[lvl] = current;
        }

        let target = self.forward(current, 0);
        if self.cmp_key(target, key) != Ordering::Equal {
            return false;
        }

        for lvl in 0..self.level {
            if self.forward(update[lvl], lvl) != target {
                break;
            }
            let next = self.forward(target, lvl);
            self.set_forward(update[lvl], lvl, next);
        }

        while self.level > 1 && self.forward(HEADER, self.level - 1) == NIL {
            self.level -= 1;
        }

        self.len -= 1;
        true
    }

    /// Removes every entry, returning the list to its just-constructed state.
    /// The underlying arena allocation is reused.
    pub fn clear(&mut self) {
        self.nodes.truncate(2);
        self.nodes[HEADER.0].forward = [NIL; MAX_LEVEL];
        self.nodes[NIL.0].forward = [NIL; MAX_LEVEL];
        self.level = 1;
        self.len = 0;
    }

    /// Iterates every entry in ascending key order.
    pub fn iter(&self) -> SkipListIter<'_> {
        self.range_from(b"")
    }

    /// Iterates entries whose key is `>= start`, in ascending key order.
    pub fn range_from<'a>(&'a self, start: &[u8]) -> SkipListIter<'a> {
        let mut current = HEADER;
        for lvl in (0..self.level).rev() {
            while self.cmp_key(self.forward(current, lvl), start) == Ordering::Less {
                current = self.forward(current, lvl);
            }
        }
        SkipListIter { list: self, current }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn forward(&self, id: NodeId, lvl: usize) -> NodeId {
        self.node(id).forward[lvl]
    }

    fn set_forward(&mut self, id: NodeId, lvl: usize, target: NodeId) {
        assert!(id != NIL, "attempted to mutate the NIL sentinel's forward pointer");
        self.nodes[id.0].forward[lvl] = target;
    }

    fn set_value(&mut self, id: NodeId, value: Vec<u8>) {
        assert!(id != NIL && id != HEADER, "attempted to mutate a sentinel node's value");
        match &mut self.nodes[id.0].kind {
            NodeKind::Value { value: v, .. } => *v = value,
            _ => unreachable!("set_value called on a non-value node"),
        }
    }

    fn cmp_key(&self, id: NodeId, key: &[u8]) -> Ordering {
        match &self.node(id).kind {
            NodeKind::Header => Ordering::Less,
            NodeKind::Nil => Ordering::Greater,
            NodeKind::Value { key: k, .. } => k.as_slice().cmp(key),
        }
    }

    fn push_value_node(&mut self, key: Vec<u8>, value: Vec<u8>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind: NodeKind::Value { key, value },
            forward: [NIL; MAX_LEVEL],
        });
        id
    }

    fn random_level(&self) -> usize {
        let mut lvl = 1;
        let mut rng = rand::thread_rng();
        while rng.gen::<f32>() < P && lvl < MAX_LEVEL {
            lvl += 1;
        }
        lvl
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Ascending-order iterator over a [`SkipList`]'s entries, produced by
/// [`SkipList::iter`] or [`SkipList::range_from`].
pub struct SkipListIter<'a> {
    list: &'a SkipList,
    current: NodeId,
}

impl<'a> Iterator for SkipListIter<'a> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        let next_id = self.list.forward(self.current, 0);
        match &self.list.node(next_id).kind {
            NodeKind::Value { key, value } => {
                self.current = next_id;
                Some((key.as_slice(), value.as_slice()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests;
