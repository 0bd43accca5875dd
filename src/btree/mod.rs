//! # B+Tree Index
//!
//! The ordered index over (u32 key -> serialized row) that gives the table
//! its sorted storage. All rows live in leaf nodes; internal nodes hold
//! separator keys and child page pointers. Leaves are chained in key order
//! for sequential scans.
//!
//! ```text
//!                   [internal, page 0]
//!                   /        |        \
//!          [leaf 2]     [leaf 3]     [leaf 1]
//!             |------------>|----------->|      (next_leaf chain)
//! ```
//!
//! ## Node Types
//!
//! - **Leaf nodes** store up to 13 cells of `(key, row)` in strictly
//!   increasing key order, plus a `next_leaf` pointer (0 ends the chain).
//! - **Internal nodes** store up to 3 cells of `(child_page, key)` where
//!   `key` is the max key in that child's subtree, plus a `right_child`
//!   pointer for keys greater than every cell key.
//!
//! ## Insert Algorithm
//!
//! ```text
//! 1. Descend from the root, binary-searching separator keys
//! 2. Binary-search the leaf for the insertion position
//! 3. Room left: shift cells right, write the new cell in place
//! 4. Leaf full: split, redistributing 14 logical cells 7/7 between the
//!    old leaf and a fresh sibling spliced into the leaf chain
//! 5. Push the new sibling into the parent; a full parent splits
//!    recursively, possibly all the way to a new root
//! ```
//!
//! The root never moves: when it splits, its contents migrate to a freshly
//! allocated left child and page 0 is rebuilt as a one-key internal node
//! over the two halves.
//!
//! ## Mid-Split Sentinel
//!
//! While an internal split moves children to the new sibling, the old
//! node's `right_child` holds `INVALID_PAGE_NUM`. The child accessors
//! refuse to traverse it, so a bug that leaks the sentinel out of a split
//! fails loudly instead of corrupting the tree.
//!
//! ## Module Organization
//!
//! - `leaf`: leaf node views over a page buffer
//! - `internal`: internal node views
//! - `tree`: multi-page operations (`BTree`, `Cursor`)

mod internal;
mod leaf;
mod tree;

pub use internal::{InternalCell, InternalNode, InternalNodeMut};
pub use leaf::{LeafNode, LeafNodeMut, SearchResult};
pub use tree::{BTree, Cursor};
