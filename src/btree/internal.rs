//! # B+Tree Internal Nodes
//!
//! Internal nodes route lookups toward the correct leaf. Each cell pairs a
//! child page number with the maximum key of that child's subtree; a
//! separate `right_child` header field points at the subtree holding every
//! key greater than the last cell key.
//!
//! ## Page Layout
//!
//! ```text
//! Offset  Content
//! ------  -------
//! 0       Internal header (14 bytes: type, root flag, parent,
//!         num_keys, right_child)
//! 14      Cell 0: child_page (4B) | key (4B)
//! 22      Cell 1: child_page (4B) | key (4B)
//! 30      Cell 2: child_page (4B) | key (4B)
//! ```
//!
//! ## Navigation Semantics
//!
//! For a search key K and cells sorted by key:
//! - K <= key[0]: descend into cell 0's child
//! - key[i-1] < K <= key[i]: descend into cell i's child
//! - K > key[num_keys-1]: descend into right_child
//!
//! ## Mid-Split Sentinel
//!
//! `right_child == INVALID_PAGE_NUM` marks a node whose children are being
//! redistributed by a split. [`InternalNode::child_at`] refuses to return
//! an unset child, so the sentinel cannot leak into a descent.
//!
//! ## Cells as Zerocopy Structs
//!
//! [`InternalCell`] is an 8-byte `#[repr(C)]` struct of unaligned
//! little-endian fields, referenced in place inside the page buffer.

use eyre::{ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{INTERNAL_NODE_CELL_SIZE, INTERNAL_NODE_HEADER_SIZE, INTERNAL_NODE_MAX_CELLS, INVALID_PAGE_NUM, PAGE_SIZE};
use crate::storage::{InternalHeader, NodeHeader, NodeType};

/// One routing entry: a child page and the max key of its subtree.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct InternalCell {
    child: U32,
    key: U32,
}

impl InternalCell {
    pub fn new(child: u32, key: u32) -> Self {
        Self {
            child: U32::new(child),
            key: U32::new(key),
        }
    }

    le_accessors! {
        child: u32,
        key: u32,
    }
}

#[derive(Debug)]
pub struct InternalNode<'a> {
    data: &'a [u8],
}

pub struct InternalNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(cell_num: u32) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
}

fn key_in_page(data: &[u8], cell_num: u32) -> u32 {
    let offset = cell_offset(cell_num) + 4;
    u32::from_le_bytes(data[offset..offset + 4].try_into().expect("fixed-width slice"))
}

fn find_child_index_in_page(data: &[u8], num_keys: u32, key: u32) -> u32 {
    let mut min_index = 0u32;
    let mut max_index = num_keys;

    while min_index != max_index {
        let index = (min_index + max_index) / 2;
        if key_in_page(data, index) >= key {
            max_index = index;
        } else {
            min_index = index + 1;
        }
    }

    min_index
}

impl<'a> InternalNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Internal,
            "expected internal node, got leaf"
        );
        Ok(Self { data })
    }

    fn header(&self) -> &InternalHeader {
        InternalHeader::from_bytes(self.data).unwrap() // INVARIANT: page validated in from_page
    }

    pub fn num_keys(&self) -> u32 {
        self.header().num_keys()
    }

    /// The raw right-child field; may be `INVALID_PAGE_NUM` mid-split.
    pub fn right_child(&self) -> u32 {
        self.header().right_child()
    }

    pub fn is_root(&self) -> bool {
        self.header().common.is_root()
    }

    pub fn parent(&self) -> u32 {
        self.header().common.parent()
    }

    pub fn cell_at(&self, cell_num: u32) -> Result<&'a InternalCell> {
        ensure!(
            cell_num < self.num_keys(),
            "cell index {} out of bounds (num_keys={})",
            cell_num,
            self.num_keys()
        );
        let offset = cell_offset(cell_num);
        InternalCell::ref_from_bytes(&self.data[offset..offset + INTERNAL_NODE_CELL_SIZE])
            .map_err(|e| eyre::eyre!("failed to read internal cell {}: {:?}", cell_num, e))
    }

    pub fn key_at(&self, cell_num: u32) -> Result<u32> {
        Ok(self.cell_at(cell_num)?.key())
    }

    /// The page number of child `child_num`, where `child_num == num_keys`
    /// selects the right child. Fails on an unset child.
    pub fn child_at(&self, child_num: u32) -> Result<u32> {
        let num_keys = self.num_keys();
        ensure!(
            child_num <= num_keys,
            "child index {} out of bounds (num_keys={})",
            child_num,
            num_keys
        );

        let page_num = if child_num == num_keys {
            self.right_child()
        } else {
            self.cell_at(child_num)?.child()
        };

        ensure!(
            page_num != INVALID_PAGE_NUM,
            "child {} of internal node is unset",
            child_num
        );
        Ok(page_num)
    }

    /// Index of the child whose subtree should contain `key`: the smallest
    /// cell whose key is >= `key`, or `num_keys` for the right child.
    pub fn find_child_index(&self, key: u32) -> u32 {
        find_child_index_in_page(self.data, self.num_keys(), key)
    }
}

impl<'a> InternalNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Internal,
            "expected internal node, got leaf"
        );
        Ok(Self { data })
    }

    /// Initializes a page as an empty non-root internal node with an unset
    /// right child.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        InternalHeader::from_bytes_mut(data)?.init();
        Ok(Self { data })
    }

    fn header(&self) -> &InternalHeader {
        InternalHeader::from_bytes(self.data).unwrap() // INVARIANT: page validated at construction
    }

    fn header_mut(&mut self) -> &mut InternalHeader {
        InternalHeader::from_bytes_mut(self.data).unwrap() // INVARIANT: page validated at construction
    }

    pub fn num_keys(&self) -> u32 {
        self.header().num_keys()
    }

    pub fn set_num_keys(&mut self, num_keys: u32) {
        self.header_mut().set_num_keys(num_keys);
    }

    pub fn right_child(&self) -> u32 {
        self.header().right_child()
    }

    pub fn set_right_child(&mut self, page_num: u32) {
        self.header_mut().set_right_child(page_num);
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.header_mut().common.set_root(is_root);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        self.header_mut().common.set_parent(page_num);
    }

    pub fn cell_at(&self, cell_num: u32) -> Result<InternalCell> {
        ensure!(
            cell_num < self.num_keys(),
            "cell index {} out of bounds (num_keys={})",
            cell_num,
            self.num_keys()
        );
        let offset = cell_offset(cell_num);
        InternalCell::read_from_bytes(&self.data[offset..offset + INTERNAL_NODE_CELL_SIZE])
            .map_err(|e| eyre::eyre!("failed to read internal cell {}: {:?}", cell_num, e))
    }

    pub fn find_child_index(&self, key: u32) -> u32 {
        find_child_index_in_page(self.data, self.num_keys(), key)
    }

    /// Writes a cell without touching the key count. The split machinery
    /// uses the slot one past `num_keys` to demote the right child, so the
    /// bound is the physical cell area, not the current count.
    pub fn set_cell(&mut self, cell_num: u32, child: u32, key: u32) -> Result<()> {
        ensure!(
            (cell_num as usize) <= INTERNAL_NODE_MAX_CELLS,
            "cell index {} out of bounds (max {})",
            cell_num,
            INTERNAL_NODE_MAX_CELLS
        );
        let offset = cell_offset(cell_num);
        let cell = InternalCell::new(child, key);
        self.data[offset..offset + INTERNAL_NODE_CELL_SIZE].copy_from_slice(cell.as_bytes());
        Ok(())
    }

    pub fn set_key_at(&mut self, cell_num: u32, key: u32) -> Result<()> {
        ensure!(
            cell_num < self.num_keys(),
            "cell index {} out of bounds (num_keys={})",
            cell_num,
            self.num_keys()
        );
        let offset = cell_offset(cell_num) + 4;
        self.data[offset..offset + 4].copy_from_slice(&key.to_le_bytes());
        Ok(())
    }

    /// Inserts a `(child, key)` cell at `index`, shifting later cells one
    /// slot right. The caller guarantees the node is not full.
    pub fn insert_cell_at(&mut self, index: u32, child: u32, key: u32) -> Result<()> {
        let num_keys = self.num_keys();
        ensure!(
            (num_keys as usize) < INTERNAL_NODE_MAX_CELLS,
            "internal node is full"
        );
        ensure!(
            index <= num_keys,
            "insert position {} out of bounds (num_keys={})",
            index,
            num_keys
        );

        if index < num_keys {
            let start = cell_offset(index);
            let end = cell_offset(num_keys);
            self.data
                .copy_within(start..end, start + INTERNAL_NODE_CELL_SIZE);
        }

        self.set_cell(index, child, key)?;
        self.set_num_keys(num_keys + 1);
        Ok(())
    }

    /// Rewrites the key cell that currently holds `old_key`. A no-op when
    /// `old_key` was the right child's max (no cell carries it).
    pub fn update_key(&mut self, old_key: u32, new_key: u32) -> Result<()> {
        let index = self.find_child_index(old_key);
        if index < self.num_keys() {
            self.set_key_at(index, new_key)?;
        }
        Ok(())
    }
}
