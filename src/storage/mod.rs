//! # Storage Module
//!
//! The foundational storage layer for tinysql: a write-back page cache over
//! positional file I/O, plus the on-page header definitions shared by the
//! B+tree node views.
//!
//! ## Architecture Overview
//!
//! The database is a single file of contiguous 4KB pages. The [`Pager`]
//! owns the open file and a fixed-capacity array of page buffers:
//!
//! ```text
//! Offset 0:      Page 0 (4KB)   <- always the root node
//! Offset 4096:   Page 1 (4KB)
//! Offset 8192:   Page 2 (4KB)
//! ...
//! ```
//!
//! Pages load lazily: the first access to a page number allocates a zeroed
//! buffer and fills it with a positional read if the page exists on disk.
//! Once loaded, a page stays pinned in the cache for the lifetime of the
//! table; there is no eviction. Mutations happen in place in the cached
//! buffer and reach disk when the table is closed (or the pager is dropped),
//! when every resident page is written back and the file is synced.
//!
//! ## Safety Model
//!
//! Page buffers are plain `Box<[u8; PAGE_SIZE]>` values owned by the pager.
//! All access goes through `get_page(&mut self)`, so the borrow checker
//! guarantees no two live mutable references to cached pages: multi-page
//! operations (splits, root creation) take their borrows strictly one at a
//! time.
//!
//! ## Module Organization
//!
//! - `page`: node type and header layouts ([`NodeHeader`], [`LeafHeader`],
//!   [`InternalHeader`])
//! - `pager`: the page cache and file I/O ([`Pager`])

mod page;
mod pager;

pub use page::{InternalHeader, LeafHeader, NodeHeader, NodeType};
pub use pager::Pager;
