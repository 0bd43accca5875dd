//! # Table - The Executor Facade
//!
//! A [`Table`] ties a pager to the B+tree rooted at page 0 and exposes the
//! operations the REPL executes: open, insert, ordered scan, diagnostic
//! dumps, close.
//!
//! ## Lifecycle
//!
//! Opening a zero-page file bootstraps page 0 as an empty root leaf.
//! Closing flushes every resident page and syncs; the pager also makes a
//! best-effort flush on drop.
//!
//! ## Recoverable Failures
//!
//! Two executor conditions are recoverable and typed as [`ExecuteError`]
//! inside the `eyre::Report`, so the REPL can downcast and keep running:
//!
//! - `DuplicateKey`: the id is already present; detected at the cursor
//!   before anything is written.
//! - `TableFull`: a split would allocate past `TABLE_MAX_PAGES`; detected
//!   by a pre-flight page budget before anything is written, so a rejected
//!   insert never leaves a half-split tree.
//!
//! Everything else (I/O failures, structural violations) is fatal and
//! propagates as a plain report.

use std::path::Path;

use eyre::Result;
use thiserror::Error;

use crate::btree::{BTree, Cursor, InternalNode, LeafNode, LeafNodeMut};
use crate::config::{COMMON_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_CELLS, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS, LEAF_NODE_SPACE_FOR_CELLS, ROW_SIZE, TABLE_MAX_PAGES};
use crate::row::Row;
use crate::storage::{NodeHeader, Pager};

/// Recoverable executor failures. Surfaced as one-line REPL messages; the
/// session continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecuteError {
    #[error("Duplicate key")]
    DuplicateKey,
    #[error("Table full")]
    TableFull,
}

pub struct Table {
    pager: Pager,
    root_page_num: u32,
}

impl Table {
    /// Opens a database file, bootstrapping an empty root leaf when the
    /// file is new.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pager = Pager::open(path)?;

        if pager.num_pages() == 0 {
            let page = pager.get_page(0)?;
            let mut root = LeafNodeMut::init(page)?;
            root.set_root(true);
        }

        Ok(Self {
            pager,
            root_page_num: 0,
        })
    }

    /// Inserts a row keyed by its id. Fails with
    /// [`ExecuteError::DuplicateKey`] when the id exists and
    /// [`ExecuteError::TableFull`] when a required split cannot be paid
    /// for; both are detected before the tree is touched.
    pub fn insert(&mut self, row: &Row) -> Result<()> {
        let key = row.id;
        let cursor = BTree::new(&mut self.pager, self.root_page_num).find(key)?;

        let leaf_is_full = {
            let page = self.pager.get_page(cursor.page_num)?;
            let leaf = LeafNode::from_page(page)?;
            let num_cells = leaf.num_cells();
            if cursor.cell_num < num_cells && leaf.key_at(cursor.cell_num)? == key {
                return Err(ExecuteError::DuplicateKey.into());
            }
            num_cells as usize >= LEAF_NODE_MAX_CELLS
        };

        if leaf_is_full {
            let needed = self.pages_needed_for_split(cursor.page_num)?;
            if self.pager.num_pages() as usize + needed > TABLE_MAX_PAGES {
                return Err(ExecuteError::TableFull.into());
            }
        }

        BTree::new(&mut self.pager, self.root_page_num).insert_at(&cursor, key, row)
    }

    /// Pages a split starting at `leaf_page_num` would allocate: one for
    /// the leaf's sibling, one per full ancestor that must split in turn,
    /// and one more when the split chain reaches the root.
    fn pages_needed_for_split(&mut self, leaf_page_num: u32) -> Result<usize> {
        let mut needed = 1;
        let mut current = leaf_page_num;

        loop {
            let (is_root, parent) = {
                let page = self.pager.get_page(current)?;
                let header = NodeHeader::from_bytes(page)?;
                (header.is_root(), header.parent())
            };
            if is_root {
                needed += 1;
                break;
            }

            let parent_full = {
                let page = self.pager.get_page(parent)?;
                let node = InternalNode::from_page(page)?;
                node.num_keys() as usize >= INTERNAL_NODE_MAX_CELLS
            };
            if !parent_full {
                break;
            }
            needed += 1;
            current = parent;
        }

        Ok(needed)
    }

    /// Lazy iterator over all rows in key order.
    pub fn rows(&mut self) -> Result<Rows<'_>> {
        let cursor = BTree::new(&mut self.pager, self.root_page_num).start()?;
        Ok(Rows {
            table: self,
            cursor,
        })
    }

    /// Renders the tree structure for the `.btree` meta-command.
    pub fn print_tree(&mut self) -> Result<String> {
        BTree::new(&mut self.pager, self.root_page_num).dump()
    }

    /// Renders the structural constants for the `.constants` meta-command.
    pub fn print_constants() -> String {
        format!(
            "ROW_SIZE: {}\n\
             COMMON_NODE_HEADER_SIZE: {}\n\
             LEAF_NODE_HEADER_SIZE: {}\n\
             LEAF_NODE_CELL_SIZE: {}\n\
             LEAF_NODE_SPACE_FOR_CELLS: {}\n\
             LEAF_NODE_MAX_CELLS: {}\n",
            ROW_SIZE,
            COMMON_NODE_HEADER_SIZE,
            LEAF_NODE_HEADER_SIZE,
            LEAF_NODE_CELL_SIZE,
            LEAF_NODE_SPACE_FOR_CELLS,
            LEAF_NODE_MAX_CELLS,
        )
    }

    /// Flushes every cached page and closes the database.
    pub fn close(mut self) -> Result<()> {
        self.pager.flush_all()
    }
}

/// Lazy, finite, non-restartable scan over the table in key order.
pub struct Rows<'a> {
    table: &'a mut Table,
    cursor: Cursor,
}

impl Iterator for Rows<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.end_of_table {
            return None;
        }

        let mut tree = BTree::new(&mut self.table.pager, self.table.root_page_num);
        let mut item = tree.row_at(&self.cursor);
        if item.is_ok() {
            if let Err(e) = tree.advance(&mut self.cursor) {
                item = Err(e);
            }
        }

        if item.is_err() {
            // A structural failure ends the scan; the caller sees the error
            // once.
            self.cursor.end_of_table = true;
        }
        Some(item)
    }
}
