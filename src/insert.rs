//! Insertion engine: add-unique, put and policy-put (spec.md §4.5–4.6).
//!
//! Grounded on `trie.h`'s `PT_(add_unique)`: a diff-bit search against a
//! "sample" key while descending, then either an in-place splice into an
//! unfull tree or a branch-promotion split when the tree is full.
//!
//! `descend` (search.rs) only tests `key`'s bit at each branch's *decision*
//! bit; it never checks whether `key` actually agrees with the bits a
//! branch's `skip` claims are shared. Reusing its landing leaf as the diff
//! candidate and scanning only from the post-descent bit position would
//! silently assume that agreement — wrong whenever `key` diverges from the
//! existing keys inside a skip region rather than at a decision bit, an
//! ordinary case, not an edge case. So the diff-bit search here always
//! compares `key` against the landed-on leaf's actual key starting from
//! this tree's own entry bit, and then locates which branch's skip region
//! (if any) the true diff-bit falls inside, splicing the new branch there
//! instead of at the leaf.
use log::debug;

use crate::errors::TrieError;
use crate::key::{bit_len, bit_test, first_diff_bit, KeyOf};
use crate::node::{Branch, Leaf, Tree};
use crate::search::descend;

pub(crate) enum UpsertResult<K> {
    Inserted,
    Replaced(K),
    /// Not inserted; the candidate value is handed back to the caller.
    Kept(K),
}

/// Insert `new_value` into `tree`, resolving a same-key collision by
/// calling `on_collision(existing, &new_value)`: `true` replaces the
/// stored value, `false` leaves it untouched.
pub(crate) fn upsert<K: KeyOf, const B: usize>(
    tree: &mut Tree<K, B>,
    new_value: K,
    on_collision: &mut dyn FnMut(&K, &K) -> bool,
) -> Result<UpsertResult<K>, TrieError> {
    let key_buf = new_value.key().to_vec();
    debug_assert!(!key_buf.contains(&0), "keys must not contain embedded zero bytes");
    upsert_inner(tree, 0, &key_buf, new_value, on_collision)
}

fn upsert_inner<K: KeyOf, const B: usize>(
    tree: &mut Tree<K, B>,
    bit_pos: usize,
    key: &[u8],
    new_value: K,
    on_collision: &mut dyn FnMut(&K, &K) -> bool,
) -> Result<UpsertResult<K>, TrieError> {
    loop {
        let d = descend(tree, key, bit_pos);

        if tree.leaf_is_child(d.leaf_idx) {
            let child = tree.leaf_mut(d.leaf_idx).as_child_mut().expect("is_child leaf");
            return upsert_inner(child, d.bit_pos, key, new_value, on_collision);
        }

        let existing_key = tree
            .leaf(d.leaf_idx)
            .as_data()
            .expect("data leaf")
            .key()
            .to_vec();
        let max_bits = bit_len(&existing_key).max(bit_len(key));

        // Compare from this tree's own entry bit, not the post-descent
        // bit: a shared `skip` region is only actually shared if `key`
        // agrees with it, which the blind descent above never checked.
        let diff_bit = match first_diff_bit(&existing_key, key, bit_pos, max_bits) {
            None => {
                let existing = tree.leaf(d.leaf_idx).as_data().expect("data leaf");
                return if on_collision(existing, &new_value) {
                    let old = tree.replace_leaf(d.leaf_idx, Leaf::Data(new_value));
                    debug!("replaced the value stored for an existing key");
                    Ok(UpsertResult::Replaced(old.into_data().expect("data leaf")))
                } else {
                    Ok(UpsertResult::Kept(new_value))
                };
            }
            Some(b) => b,
        };

        if tree.is_full() {
            debug!("tree full at {} branches, splitting root before inserting", tree.branch_count());
            tree.split_root();
            continue;
        }

        let new_goes_left = !bit_test(key, diff_bit);

        // The first branch on the descent path whose skip region actually
        // straddles diff_bit is the true splice point. A branch already
        // visited cannot have its *decision* bit equal to diff_bit: the
        // blind descent above sent `key` into the subtree that, by
        // construction, shares that decision bit's value, so if `key`
        // differed there it would have diverged even earlier. So diff_bit
        // either falls strictly inside some branch's skip region, or lies
        // at or past the bit position the full descent landed on.
        let split_at = d.path.iter().enumerate().find_map(
            |(path_i, &(branch_idx, _, subtree_size, entry_bit_pos, leaf_start))| {
                let decision_bit = entry_bit_pos + tree.branch(branch_idx).skip as usize;
                (diff_bit < decision_bit).then_some((path_i, branch_idx, subtree_size, entry_bit_pos, leaf_start))
            },
        );

        return match split_at {
            Some((path_i, branch_idx, subtree_size, entry_bit_pos, leaf_start)) => {
                let local_skip = diff_bit - entry_bit_pos;
                if local_skip > u8::MAX as usize {
                    return Err(TrieError::BitsExhausted);
                }
                for &(anc_idx, went_left, ..) in &d.path[..path_i] {
                    if went_left {
                        tree.branch_mut(anc_idx).left += 1;
                    }
                }
                let old_skip = tree.branch(branch_idx).skip;
                let new_branch_left = if new_goes_left { 1 } else { subtree_size as u8 };
                let new_leaf_idx = if new_goes_left { leaf_start } else { leaf_start + subtree_size };
                tree.insert_branch_leaf(
                    branch_idx,
                    new_leaf_idx,
                    Branch { left: new_branch_left, skip: local_skip as u8 },
                    Leaf::Data(new_value),
                );
                // The old branch shifted to branch_idx + 1; shorten its
                // skip by the bits the new branch now accounts for
                // (spec.md §4.5 Stage 3's "decrement that branch's skip").
                let shifted = tree.branch_mut(branch_idx + 1);
                shifted.skip = old_skip - local_skip as u8 - 1;
                debug!("spliced a branch inside an existing skip region");
                Ok(UpsertResult::Inserted)
            }
            None => {
                let local_skip = diff_bit - d.bit_pos;
                if local_skip > u8::MAX as usize {
                    return Err(TrieError::BitsExhausted);
                }
                for &(anc_idx, went_left, ..) in &d.path {
                    if went_left {
                        tree.branch_mut(anc_idx).left += 1;
                    }
                }
                let new_leaf_idx = if new_goes_left { d.leaf_idx } else { d.leaf_idx + 1 };
                tree.insert_branch_leaf(
                    d.insertion_branch_idx,
                    new_leaf_idx,
                    Branch { left: 1, skip: local_skip as u8 },
                    Leaf::Data(new_value),
                );
                Ok(UpsertResult::Inserted)
            }
        };
    }
}
