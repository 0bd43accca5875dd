//! # B+Tree Operations
//!
//! Multi-page tree operations: descent, ordered insert, leaf and internal
//! splits, root creation, and leaf-chain iteration. Everything in this
//! module works with page numbers and borrows pages from the pager one at a
//! time, so no two page buffers are ever mutably aliased.
//!
//! ## Split Propagation
//!
//! ```text
//! leaf_insert
//!   └─ full ─> leaf_split_and_insert
//!                 ├─ old leaf was root ─> create_new_root
//!                 └─ else ─> update parent key, internal_node_insert
//!                               └─ parent full ─> internal_node_split_and_insert
//!                                                    ├─ parent was root ─> create_new_root
//!                                                    └─ else ─> insert sibling into grandparent
//!                                                               (recursing as needed)
//! ```
//!
//! ## Leaf Split
//!
//! A full leaf plus the incoming cell make `LEAF_NODE_MAX_CELLS + 1`
//! logical cells. Logical index `i` lands in the new right sibling when
//! `i >= LEAF_NODE_LEFT_SPLIT_COUNT`, at position
//! `i % LEAF_NODE_LEFT_SPLIT_COUNT`; the cell at the cursor position is the
//! incoming row, cells above it shift up by one. The redistribution reads
//! from a snapshot of the old page, which produces the same bytes as the
//! original in-place right-to-left rewrite without aliasing two live
//! buffers.
//!
//! ## Internal Split
//!
//! The old node's upper children move one at a time into a fresh sibling,
//! right child first. While they move, the old node's `right_child` is
//! parked at `INVALID_PAGE_NUM` and repaired afterwards by promoting the
//! last remaining cell child. The pending child then goes to whichever half
//! now bounds its max key, and the sibling is pushed up into the parent.
//!
//! ## Root Creation
//!
//! The root never changes page number. Splitting it copies its bytes into a
//! freshly allocated left child, reparents that child's children when it is
//! internal, and rebuilds page 0 as a one-key internal node over the left
//! copy and the split's right sibling.

use std::fmt::Write as _;

use eyre::{ensure, Result};

use crate::btree::internal::{InternalNode, InternalNodeMut};
use crate::btree::leaf::{LeafNode, LeafNodeMut, SearchResult};
use crate::config::{INTERNAL_NODE_MAX_CELLS, INVALID_PAGE_NUM, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS, LEAF_NODE_RIGHT_SPLIT_COUNT, PAGE_SIZE};
use crate::row::Row;
use crate::storage::{NodeHeader, NodeType, Pager};

/// A position in the tree: a leaf page, a cell index within it, and a flag
/// marking the end of iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub page_num: u32,
    pub cell_num: u32,
    pub end_of_table: bool,
}

#[derive(Debug)]
pub struct BTree<'a> {
    pager: &'a mut Pager,
    root_page_num: u32,
}

impl<'a> BTree<'a> {
    pub fn new(pager: &'a mut Pager, root_page_num: u32) -> Self {
        Self {
            pager,
            root_page_num,
        }
    }

    fn node_type(&mut self, page_num: u32) -> Result<NodeType> {
        let page = self.pager.get_page(page_num)?;
        NodeHeader::from_bytes(page)?.node_type()
    }

    fn set_parent(&mut self, page_num: u32, parent: u32) -> Result<()> {
        let page = self.pager.get_page(page_num)?;
        NodeHeader::from_bytes_mut(page)?.set_parent(parent);
        Ok(())
    }

    /// Largest key in the subtree rooted at `page_num`: the last key of a
    /// leaf, or recursively the max key of an internal node's right child.
    /// Must not be called on a node whose right child is mid-split.
    pub fn node_max_key(&mut self, page_num: u32) -> Result<u32> {
        let mut current = page_num;
        loop {
            let page = self.pager.get_page(current)?;
            match NodeHeader::from_bytes(page)?.node_type()? {
                NodeType::Leaf => return LeafNode::from_page(page)?.max_key(),
                NodeType::Internal => {
                    let right = InternalNode::from_page(page)?.right_child();
                    ensure!(
                        right != INVALID_PAGE_NUM,
                        "max-key scan hit an unset right child at page {}",
                        current
                    );
                    current = right;
                }
            }
        }
    }

    /// Descends from the root to the leaf cell where `key` lives or
    /// belongs.
    pub fn find(&mut self, key: u32) -> Result<Cursor> {
        let mut current = self.root_page_num;
        loop {
            let page = self.pager.get_page(current)?;
            match NodeHeader::from_bytes(page)?.node_type()? {
                NodeType::Leaf => {
                    let leaf = LeafNode::from_page(page)?;
                    let cell_num = match leaf.find(key) {
                        SearchResult::Found(index) => index,
                        SearchResult::NotFound(index) => index,
                    };
                    return Ok(Cursor {
                        page_num: current,
                        cell_num,
                        end_of_table: false,
                    });
                }
                NodeType::Internal => {
                    let node = InternalNode::from_page(page)?;
                    let index = node.find_child_index(key);
                    current = node.child_at(index)?;
                }
            }
        }
    }

    /// Cursor at the first row in key order.
    pub fn start(&mut self) -> Result<Cursor> {
        let mut cursor = self.find(0)?;
        let page = self.pager.get_page(cursor.page_num)?;
        cursor.end_of_table = LeafNode::from_page(page)?.num_cells() == 0;
        Ok(cursor)
    }

    /// Moves a cursor to the next cell, following the leaf chain across
    /// page boundaries.
    pub fn advance(&mut self, cursor: &mut Cursor) -> Result<()> {
        let page = self.pager.get_page(cursor.page_num)?;
        let leaf = LeafNode::from_page(page)?;

        cursor.cell_num += 1;
        if cursor.cell_num >= leaf.num_cells() {
            let next = leaf.next_leaf();
            if next == 0 {
                cursor.end_of_table = true;
            } else {
                cursor.page_num = next;
                cursor.cell_num = 0;
            }
        }
        Ok(())
    }

    /// The row under a cursor.
    pub fn row_at(&mut self, cursor: &Cursor) -> Result<Row> {
        let page = self.pager.get_page(cursor.page_num)?;
        let leaf = LeafNode::from_page(page)?;
        Row::deserialize(leaf.value_at(cursor.cell_num)?)
    }

    /// Inserts a cell at a cursor obtained from [`BTree::find`], splitting
    /// the leaf when it is full.
    pub fn insert_at(&mut self, cursor: &Cursor, key: u32, row: &Row) -> Result<()> {
        {
            let page = self.pager.get_page(cursor.page_num)?;
            let mut leaf = LeafNodeMut::from_page(page)?;
            if (leaf.num_cells() as usize) < LEAF_NODE_MAX_CELLS {
                return leaf.insert_at(cursor.cell_num, key, row);
            }
        }
        self.leaf_split_and_insert(cursor, key, row)
    }

    fn leaf_split_and_insert(&mut self, cursor: &Cursor, key: u32, row: &Row) -> Result<()> {
        let old_max = self.node_max_key(cursor.page_num)?;
        let new_page_num = self.pager.get_unused_page_num()?;

        let mut snapshot = [0u8; PAGE_SIZE];
        snapshot.copy_from_slice(self.pager.get_page(cursor.page_num)?);
        let snap = LeafNode::from_page(&snapshot)?;
        let old_next_leaf = snap.next_leaf();
        let old_parent = snap.parent();
        let old_was_root = snap.is_root();

        let insert_index = cursor.cell_num as usize;

        // Left half: logical cells [0, LEFT_SPLIT_COUNT)
        {
            let page = self.pager.get_page(cursor.page_num)?;
            let mut old = LeafNodeMut::from_page(page)?;
            for i in 0..LEAF_NODE_LEFT_SPLIT_COUNT {
                let position = (i % LEAF_NODE_LEFT_SPLIT_COUNT) as u32;
                if i == insert_index {
                    old.write_cell(position, key, row)?;
                } else if i > insert_index {
                    old.copy_cell_from(position, snap.cell_bytes((i - 1) as u32)?)?;
                } else {
                    old.copy_cell_from(position, snap.cell_bytes(i as u32)?)?;
                }
            }
            old.set_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT as u32);
            old.set_next_leaf(new_page_num);
        }

        // Right half: logical cells [LEFT_SPLIT_COUNT, MAX_CELLS]
        {
            let page = self.pager.get_page(new_page_num)?;
            let mut new = LeafNodeMut::init(page)?;
            for i in LEAF_NODE_LEFT_SPLIT_COUNT..=LEAF_NODE_MAX_CELLS {
                let position = (i % LEAF_NODE_LEFT_SPLIT_COUNT) as u32;
                if i == insert_index {
                    new.write_cell(position, key, row)?;
                } else if i > insert_index {
                    new.copy_cell_from(position, snap.cell_bytes((i - 1) as u32)?)?;
                } else {
                    new.copy_cell_from(position, snap.cell_bytes(i as u32)?)?;
                }
            }
            new.set_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT as u32);
            new.set_next_leaf(old_next_leaf);
            new.set_parent(old_parent);
        }

        if old_was_root {
            return self.create_new_root(new_page_num);
        }

        let new_max = self.node_max_key(cursor.page_num)?;
        {
            let page = self.pager.get_page(old_parent)?;
            InternalNodeMut::from_page(page)?.update_key(old_max, new_max)?;
        }
        self.internal_node_insert(old_parent, new_page_num)
    }

    /// Adds `child_page_num` to an internal node, splitting the node when
    /// it is already at capacity.
    fn internal_node_insert(&mut self, parent_page_num: u32, child_page_num: u32) -> Result<()> {
        let child_max = self.node_max_key(child_page_num)?;

        let (num_keys, right_child) = {
            let page = self.pager.get_page(parent_page_num)?;
            let parent = InternalNode::from_page(page)?;
            (parent.num_keys(), parent.right_child())
        };

        if num_keys as usize >= INTERNAL_NODE_MAX_CELLS {
            return self.internal_node_split_and_insert(parent_page_num, child_page_num);
        }

        if right_child == INVALID_PAGE_NUM {
            // Node emptied by a split in progress; the child becomes its
            // sole (right) child.
            let page = self.pager.get_page(parent_page_num)?;
            InternalNodeMut::from_page(page)?.set_right_child(child_page_num);
            return Ok(());
        }

        let right_max = self.node_max_key(right_child)?;
        let page = self.pager.get_page(parent_page_num)?;
        let mut parent = InternalNodeMut::from_page(page)?;

        if child_max > right_max {
            // The new child supersedes the right child, which moves into
            // the last cell.
            parent.set_cell(num_keys, right_child, right_max)?;
            parent.set_num_keys(num_keys + 1);
            parent.set_right_child(child_page_num);
        } else {
            let index = parent.find_child_index(child_max);
            parent.insert_cell_at(index, child_page_num, child_max)?;
        }
        Ok(())
    }

    fn internal_node_split_and_insert(
        &mut self,
        split_page_num: u32,
        child_page_num: u32,
    ) -> Result<()> {
        let mut old_page_num = split_page_num;
        let old_max = self.node_max_key(old_page_num)?;
        let child_max = self.node_max_key(child_page_num)?;
        let new_page_num = self.pager.get_unused_page_num()?;

        let splitting_root = {
            let page = self.pager.get_page(old_page_num)?;
            NodeHeader::from_bytes(page)?.is_root()
        };

        let parent_page_num = if splitting_root {
            // The old content now lives as the new root's left child.
            self.create_new_root(new_page_num)?;
            let page = self.pager.get_page(self.root_page_num)?;
            old_page_num = InternalNode::from_page(page)?.child_at(0)?;
            self.root_page_num
        } else {
            let parent = {
                let page = self.pager.get_page(old_page_num)?;
                NodeHeader::from_bytes(page)?.parent()
            };
            let page = self.pager.get_page(new_page_num)?;
            InternalNodeMut::init(page)?;
            parent
        };

        // Move the upper half of the old node's children into the new
        // sibling, starting with the right child. The old node's right
        // child stays parked at INVALID_PAGE_NUM until the move finishes.
        let moving_right = {
            let page = self.pager.get_page(old_page_num)?;
            let old = InternalNode::from_page(page)?;
            let right = old.right_child();
            ensure!(
                right != INVALID_PAGE_NUM,
                "splitting internal node {} with an unset right child",
                old_page_num
            );
            right
        };
        self.internal_node_insert(new_page_num, moving_right)?;
        self.set_parent(moving_right, new_page_num)?;
        {
            let page = self.pager.get_page(old_page_num)?;
            InternalNodeMut::from_page(page)?.set_right_child(INVALID_PAGE_NUM);
        }

        for i in ((INTERNAL_NODE_MAX_CELLS / 2 + 1)..INTERNAL_NODE_MAX_CELLS).rev() {
            let moving = {
                let page = self.pager.get_page(old_page_num)?;
                InternalNode::from_page(page)?.cell_at(i as u32)?.child()
            };
            self.internal_node_insert(new_page_num, moving)?;
            self.set_parent(moving, new_page_num)?;

            let page = self.pager.get_page(old_page_num)?;
            let mut old = InternalNodeMut::from_page(page)?;
            let num_keys = old.num_keys();
            old.set_num_keys(num_keys - 1);
        }

        // Repair the old node: its last remaining cell child becomes the
        // right child.
        {
            let page = self.pager.get_page(old_page_num)?;
            let mut old = InternalNodeMut::from_page(page)?;
            let num_keys = old.num_keys();
            let promoted = old.cell_at(num_keys - 1)?.child();
            old.set_right_child(promoted);
            old.set_num_keys(num_keys - 1);
        }

        // Route the pending child into whichever half now bounds it.
        let max_after_split = self.node_max_key(old_page_num)?;
        let destination = if child_max >= max_after_split {
            new_page_num
        } else {
            old_page_num
        };
        self.set_parent(child_page_num, destination)?;
        self.internal_node_insert(destination, child_page_num)?;

        let new_old_max = self.node_max_key(old_page_num)?;
        {
            let page = self.pager.get_page(parent_page_num)?;
            InternalNodeMut::from_page(page)?.update_key(old_max, new_old_max)?;
        }

        if !splitting_root {
            self.set_parent(new_page_num, parent_page_num)?;
            self.internal_node_insert(parent_page_num, new_page_num)?;
        }
        Ok(())
    }

    /// Rebuilds page 0 as a one-key internal root after a root split. The
    /// old root's bytes move to a freshly allocated left child;
    /// `right_child_page_num` is the split's new sibling.
    pub fn create_new_root(&mut self, right_child_page_num: u32) -> Result<()> {
        let root_page_num = self.root_page_num;

        // Materialize the right child before allocating the left child: the
        // internal-split path hands over a page number it has not touched
        // yet, and an unmaterialized page is still what get_unused_page_num
        // would return.
        self.pager.get_page(right_child_page_num)?;
        let left_child_page_num = self.pager.get_unused_page_num()?;

        let mut snapshot = [0u8; PAGE_SIZE];
        snapshot.copy_from_slice(self.pager.get_page(root_page_num)?);
        let root_was_internal =
            NodeHeader::from_bytes(&snapshot)?.node_type()? == NodeType::Internal;

        if root_was_internal {
            // An internal split reaches here before materializing its new
            // sibling; the sibling starts as an empty internal node.
            let page = self.pager.get_page(right_child_page_num)?;
            InternalNodeMut::init(page)?;
        }

        {
            let page = self.pager.get_page(left_child_page_num)?;
            page.copy_from_slice(&snapshot);
            NodeHeader::from_bytes_mut(page)?.set_root(false);
        }

        if root_was_internal {
            let snap = InternalNode::from_page(&snapshot)?;
            let num_keys = snap.num_keys();
            for i in 0..num_keys {
                let child = snap.cell_at(i)?.child();
                self.set_parent(child, left_child_page_num)?;
            }
            let right = snap.right_child();
            ensure!(
                right != INVALID_PAGE_NUM,
                "old root has an unset right child"
            );
            self.set_parent(right, left_child_page_num)?;
        }

        let left_max = self.node_max_key(left_child_page_num)?;
        {
            let page = self.pager.get_page(root_page_num)?;
            let mut root = InternalNodeMut::init(page)?;
            root.set_root(true);
            root.set_cell(0, left_child_page_num, left_max)?;
            root.set_num_keys(1);
            root.set_right_child(right_child_page_num);
        }
        self.set_parent(left_child_page_num, root_page_num)?;
        self.set_parent(right_child_page_num, root_page_num)?;
        Ok(())
    }

    /// Renders the tree structure, one node per line, children indented
    /// under their parent.
    pub fn dump(&mut self) -> Result<String> {
        let mut out = String::new();
        self.dump_node(&mut out, self.root_page_num, 0)?;
        Ok(out)
    }

    fn dump_node(&mut self, out: &mut String, page_num: u32, depth: usize) -> Result<()> {
        let indent = "  ".repeat(depth);
        match self.node_type(page_num)? {
            NodeType::Leaf => {
                let (num_cells, keys) = {
                    let page = self.pager.get_page(page_num)?;
                    let leaf = LeafNode::from_page(page)?;
                    let num_cells = leaf.num_cells();
                    let keys: Result<Vec<u32>> = (0..num_cells).map(|i| leaf.key_at(i)).collect();
                    (num_cells, keys?)
                };
                writeln!(out, "{}- leaf (size {})", indent, num_cells)?;
                for key in keys {
                    writeln!(out, "{}  - {}", indent, key)?;
                }
            }
            NodeType::Internal => {
                let (num_keys, cells, right_child) = {
                    let page = self.pager.get_page(page_num)?;
                    let node = InternalNode::from_page(page)?;
                    let num_keys = node.num_keys();
                    let mut cells = Vec::with_capacity(num_keys as usize);
                    for i in 0..num_keys {
                        let cell = node.cell_at(i)?;
                        cells.push((cell.child(), cell.key()));
                    }
                    (num_keys, cells, node.child_at(num_keys)?)
                };
                writeln!(out, "{}- internal (size {})", indent, num_keys)?;
                if num_keys > 0 {
                    for (child, key) in cells {
                        self.dump_node(out, child, depth + 1)?;
                        writeln!(out, "{}  - key {}", indent, key)?;
                    }
                    self.dump_node(out, right_child, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}
