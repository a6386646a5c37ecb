//! Removal engine (spec.md §4.7).
//!
//! Grounded on `trie.h`'s `PT_(index_remove)`: find the leaf, delete its
//! governing branch, and merge the eliminated branch's skip into whatever
//! takes its place. The branch that immediately governs a removed leaf
//! always has a well-defined sibling (the other side of that branch's
//! decision); when that sibling is itself more than one leaf, the merge
//! lands on the sibling subtree's own first branch within the same tree.
//! When it is a lone leaf, and that leaf is a child-tree root, the merge
//! lands on the child's first branch instead. When removal leaves a tree
//! with no branches at all, the tree collapses entirely and its last leaf
//! is handed back to the caller to splice into its own slot — mirroring
//! the merge-on-collapse behavior `trie.h` marks with a `/* fixme */` near
//! its own skip bound check (see DESIGN.md's Open Question resolution).

use log::{debug, trace};

use crate::errors::TrieError;
use crate::key::KeyOf;
use crate::node::{Leaf, Tree};
use crate::search::descend;

/// What a caller must splice into the slot that used to hold a now-gone
/// child tree.
pub(crate) enum CollapsedChild<K, const B: usize> {
    Value(K),
    Subtree(Box<Tree<K, B>>),
}

pub(crate) enum RemoveStep<K, const B: usize> {
    /// The key was removed; this tree is otherwise intact.
    Done(K),
    /// The key was removed and this tree collapsed to nothing; the
    /// caller must replace its own leaf slot with `CollapsedChild`.
    Collapse(K, CollapsedChild<K, B>),
    /// The key was removed and this was the tree's only leaf; only valid
    /// when `tree` is the forest root.
    Empty(K),
}

fn merge_skip(branch_skip: u8, extra_bit: usize, into: u8) -> Result<u8, TrieError> {
    let merged = branch_skip as usize + extra_bit + into as usize;
    if merged > u8::MAX as usize {
        Err(TrieError::SkipOverflow)
    } else {
        Ok(merged as u8)
    }
}

pub(crate) fn remove_rec<K: KeyOf, const B: usize>(
    tree: &mut Tree<K, B>,
    bit_pos: usize,
    key: &[u8],
) -> Result<Option<RemoveStep<K, B>>, TrieError> {
    let d = descend(tree, key, bit_pos);

    if tree.leaf_is_child(d.leaf_idx) {
        trace!("remove: leaf {} is a child tree, continuing", d.leaf_idx);
        let child = tree.leaf_mut(d.leaf_idx).as_child_mut().expect("is_child leaf");
        return match remove_rec(child, d.bit_pos, key)? {
            None => Ok(None),
            Some(RemoveStep::Done(v)) => Ok(Some(RemoveStep::Done(v))),
            Some(RemoveStep::Collapse(v, collapsed)) => {
                match collapsed {
                    CollapsedChild::Value(sib) => {
                        tree.put_leaf(d.leaf_idx, Leaf::Data(sib));
                        tree.set_is_child(d.leaf_idx, false);
                    }
                    CollapsedChild::Subtree(sub) => {
                        tree.put_leaf(d.leaf_idx, Leaf::Child(sub));
                    }
                }
                Ok(Some(RemoveStep::Done(v)))
            }
            Some(RemoveStep::Empty(_)) => {
                unreachable!("child trees always hold at least two leaves")
            }
        };
    }

    if tree.leaf(d.leaf_idx).as_data().expect("data leaf").key() != key {
        return Ok(None);
    }

    if tree.leaf_count() == 1 {
        let v = tree.take_leaf(d.leaf_idx).into_data().expect("data leaf");
        return Ok(Some(RemoveStep::Empty(v)));
    }

    let &(last_branch_idx, went_left, subtree_size_before, ..) =
        d.path.last().expect("leaf_count() > 1 implies at least one branch");
    let sibling_size = subtree_size_before - 1;
    let eliminated_skip = tree.branch(last_branch_idx).skip;

    if sibling_size == 1 {
        let sibling_leaf_idx = if went_left { d.leaf_idx + 1 } else { d.leaf_idx - 1 };
        if let Leaf::Child(sub) = tree.leaf_mut(sibling_leaf_idx) {
            let root = sub.branch_mut(0);
            root.skip = merge_skip(eliminated_skip, 1, root.skip)?;
            debug!("merged an eliminated branch's skip into the sibling child tree's root");
        }
    } else {
        let sib_root_idx = last_branch_idx + 1;
        let root = tree.branch_mut(sib_root_idx);
        root.skip = merge_skip(eliminated_skip, 1, root.skip)?;
        debug!("merged an eliminated branch's skip into the sibling subtree's root");
    }

    for &(branch_idx, went_left_earlier, ..) in &d.path[..d.path.len() - 1] {
        if went_left_earlier {
            tree.branch_mut(branch_idx).left -= 1;
        }
    }

    let removed_value = tree
        .remove_branch_leaf(last_branch_idx, d.leaf_idx)
        .into_data()
        .expect("data leaf");

    if tree.branch_count() == 0 {
        let remaining = tree.take_leaf(0);
        let collapsed = match remaining {
            Leaf::Data(v) => CollapsedChild::Value(v),
            Leaf::Child(sub) => CollapsedChild::Subtree(sub),
        };
        debug!("tree collapsed to its last leaf on removal");
        return Ok(Some(RemoveStep::Collapse(removed_value, collapsed)));
    }

    Ok(Some(RemoveStep::Done(removed_value)))
}
