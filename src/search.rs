//! Search engine: bit-by-bit forest descent shared by lookup, insertion and
//! removal.
//!
//! Grounded on `trie.h`'s `PT_(match)` (descend to a candidate leaf without
//! verifying the skipped bits) and `PT_(get)` (match, then verify equality
//! against the candidate's actual key).

use log::trace;

use crate::key::{bit_test, KeyOf};
use crate::node::{Leaf, Tree};

/// The outcome of descending through a single tree's implicit binary
/// layout to the leaf a key's bits point at. The candidate leaf is not
/// guaranteed to actually match the key past this tree's branches (a data
/// leaf may still diverge in skipped bits) — that verification is the
/// caller's job.
pub(crate) struct Descent {
    /// `(branch_idx, went_left, subtree_size_before, entry_bit_pos,
    /// leaf_start_before)` for every branch visited, in descent order.
    /// `subtree_size_before`/`leaf_start_before` describe the leaf range
    /// governed by that branch before its decision narrowed it down;
    /// `entry_bit_pos` is the absolute bit position where that branch's
    /// `skip` region begins. The insertion engine uses `went_left` to bump
    /// ancestor `left` counts when a new leaf is spliced in, and uses
    /// `entry_bit_pos`/`subtree_size_before`/`leaf_start_before` to find
    /// and splice at the true diff-bit when it falls inside an already
    /// established branch's skip region; the removal engine uses
    /// `subtree_size_before` to size up the sibling of a removed leaf.
    pub(crate) path: Vec<(usize, bool, usize, usize, usize)>,
    /// Branch-array index a new branch would occupy if this leaf were
    /// split into a 2-leaf subtree.
    pub(crate) insertion_branch_idx: usize,
    /// Index of the candidate leaf within the tree's leaf array.
    pub(crate) leaf_idx: usize,
    /// Absolute bit offset reached once the candidate leaf is found (the
    /// bit immediately after the last branch's decision bit).
    pub(crate) bit_pos: usize,
}

/// Descend `tree`'s implicit binary layout following `key`'s bits,
/// starting at `bit_pos`. Returns the full descent record.
///
/// This only ever tests `key`'s bit at each branch's *decision* bit; it
/// never verifies the bits a branch's `skip` claims are shared. That is
/// fine for `raw_match`/`get` (which verify the candidate's full key
/// afterward) but is not by itself a sound basis for locating an
/// insertion's true diff-bit — see `insert.rs`.
pub(crate) fn descend<V, const B: usize>(tree: &Tree<V, B>, key: &[u8], bit_pos: usize) -> Descent {
    trace!("descend: tree entry at bit {bit_pos}, {} leaves", tree.leaf_count());
    let mut branch_idx = 0usize;
    let mut leaf_start = 0usize;
    let mut leaf_range = tree.leaf_count();
    let mut bit_pos = bit_pos;
    let mut path = Vec::new();
    while leaf_range > 1 {
        let subtree_size_before = leaf_range;
        let entry_bit_pos = bit_pos;
        let leaf_start_before = leaf_start;
        let branch = *tree.branch(branch_idx);
        bit_pos += branch.skip as usize;
        let went_right = bit_test(key, bit_pos);
        bit_pos += 1;
        trace!(
            "descend: branch {branch_idx} decision bit {} -> {}",
            entry_bit_pos + branch.skip as usize,
            if went_right { "right" } else { "left" }
        );
        if went_right {
            path.push((branch_idx, false, subtree_size_before, entry_bit_pos, leaf_start_before));
            leaf_start += branch.left as usize;
            leaf_range -= branch.left as usize;
            branch_idx += branch.left as usize;
        } else {
            path.push((branch_idx, true, subtree_size_before, entry_bit_pos, leaf_start_before));
            leaf_range = branch.left as usize;
            branch_idx += 1;
        }
    }
    trace!("descend: landed on leaf {leaf_start}");
    Descent { path, insertion_branch_idx: branch_idx, leaf_idx: leaf_start, bit_pos }
}

/// Index-only match: descend the forest (following child-tree leaves) and
/// return the candidate value, without verifying the skipped bits.
/// Grounded on `trie.h`'s `PT_(match)`.
pub(crate) fn raw_match<'a, K, const B: usize>(
    mut tree: &'a Tree<K, B>,
    key: &[u8],
    mut bit_pos: usize,
) -> Option<&'a K> {
    loop {
        let d = descend(tree, key, bit_pos);
        match tree.leaf(d.leaf_idx) {
            Leaf::Data(v) => return Some(v),
            Leaf::Child(child) => {
                trace!("descend: leaf {} is a child tree, continuing", d.leaf_idx);
                tree = child;
                bit_pos = d.bit_pos;
            }
        }
    }
}

/// Full match: descend, then verify the candidate's projected key equals
/// `key` exactly. Grounded on `trie.h`'s `PT_(get)`.
pub(crate) fn get<'a, K: KeyOf, const B: usize>(
    tree: &'a Tree<K, B>,
    key: &[u8],
) -> Option<&'a K> {
    let candidate = raw_match(tree, key, 0)?;
    if candidate.key() == key {
        Some(candidate)
    } else {
        None
    }
}
