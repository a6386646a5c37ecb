//! Error types for trie mutation.
//!
//! Hand-rolled, matching the teacher's `PrefixStoreError` shape
//! (`src/types/errors.rs`): a plain enum with a manual `Display` impl and
//! `std::error::Error`, no `thiserror`.

use std::fmt;

/// Failure modes for a trie-mutating operation.
///
/// Allocation failure is not represented here: this crate allocates
/// infallibly via `Box`/`Vec`, as the teacher does throughout, so an
/// out-of-memory condition aborts the process rather than surfacing as a
/// `Result` arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrieError {
    /// A key's bit length exceeds what the search/insert engine can
    /// address (spec.md §7).
    BitsExhausted,
    /// Merging two branches on removal would push a `skip` value past the
    /// 255-bit field width (spec.md §7, §9).
    SkipOverflow,
}

impl fmt::Display for TrieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrieError::BitsExhausted => {
                write!(f, "key exhausts the addressable bit range")
            }
            TrieError::SkipOverflow => {
                write!(f, "branch merge would overflow the skip field")
            }
        }
    }
}

impl std::error::Error for TrieError {}
