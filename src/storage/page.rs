//! # Node Headers and Page Layout
//!
//! Every 4KB page holds one B+tree node and begins with a 6-byte common
//! header, extended to 14 bytes by the node-specific fields.
//!
//! ## Common Header Layout (6 bytes)
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ----------------------------------------
//! 0       1     node_type    0 = internal, 1 = leaf
//! 1       1     is_root      Root flag (0/1)
//! 2       4     parent       Parent page number (unused on the root)
//! ```
//!
//! ## Leaf Header (14 bytes)
//!
//! ```text
//! 6       4     num_cells    Number of (key, row) cells in this leaf
//! 10      4     next_leaf    Next leaf in key order (0 = end of chain)
//! ```
//!
//! Leaf cells follow at offset 14: a little-endian u32 key and a 291-byte
//! serialized row, 295 bytes per cell, 13 cells per page.
//!
//! ## Internal Header (14 bytes)
//!
//! ```text
//! 6       4     num_keys     Number of (child, key) cells
//! 10      4     right_child  Rightmost child page number
//! ```
//!
//! Internal cells follow at offset 14: a child page number and the max key
//! of that child's subtree, 8 bytes per cell. `right_child` holds
//! `INVALID_PAGE_NUM` only transiently while a split moves children.
//!
//! ## Zero-Copy Access
//!
//! Headers are `#[repr(C)]` zerocopy structs of unaligned little-endian
//! fields, parsed in place from the page buffer:
//!
//! ```text
//! let header = NodeHeader::from_bytes(&page)?;
//! ```
//!
//! No data is copied; setters write straight through to the cached page.

use eyre::{bail, ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::INVALID_PAGE_NUM;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(NodeType::Internal),
            1 => Ok(NodeType::Leaf),
            other => bail!("invalid node type byte: {:#04x}", other),
        }
    }
}

/// Common prefix of every node: type, root flag, parent pointer.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct NodeHeader {
    node_type: u8,
    is_root: u8,
    parent: U32,
}

impl NodeHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn node_type(&self) -> Result<NodeType> {
        NodeType::from_byte(self.node_type)
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type as u8;
    }

    pub fn is_root(&self) -> bool {
        self.is_root != 0
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.is_root = is_root as u8;
    }

    le_accessors! {
        parent: u32,
    }
}

/// Full header of a leaf node.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct LeafHeader {
    pub common: NodeHeader,
    num_cells: U32,
    next_leaf: U32,
}

impl LeafHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
    }

    /// Resets the header to an empty non-root leaf.
    pub fn init(&mut self) {
        self.common.set_node_type(NodeType::Leaf);
        self.common.set_root(false);
        self.common.set_parent(0);
        self.set_num_cells(0);
        self.set_next_leaf(0);
    }

    le_accessors! {
        num_cells: u32,
        next_leaf: u32,
    }
}

/// Full header of an internal node.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct InternalHeader {
    pub common: NodeHeader,
    num_keys: U32,
    right_child: U32,
}

impl InternalHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InternalHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InternalHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InternalHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );
        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InternalHeader: {:?}", e))
    }

    /// Resets the header to an empty non-root internal node. The right child
    /// starts out unset; the first child inserted claims it.
    pub fn init(&mut self) {
        self.common.set_node_type(NodeType::Internal);
        self.common.set_root(false);
        self.common.set_parent(0);
        self.set_num_keys(0);
        self.set_right_child(INVALID_PAGE_NUM);
    }

    le_accessors! {
        num_keys: u32,
        right_child: u32,
    }
}
