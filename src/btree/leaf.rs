//! # B+Tree Leaf Nodes
//!
//! Leaf nodes store the actual rows. Cells sit directly after the 14-byte
//! leaf header, each one a little-endian u32 key followed by a 291-byte
//! serialized row:
//!
//! ```text
//! Offset  Content
//! ------  -------
//! 0       Leaf header (14 bytes: type, root flag, parent,
//!         num_cells, next_leaf)
//! 14      Cell 0: key (4B) | row (291B)
//! 309     Cell 1: key (4B) | row (291B)
//! ...
//! 3554    Cell 12: key (4B) | row (291B)
//! 3849    Dead space up to the page end (247 bytes)
//! ```
//!
//! Thirteen cells fit per leaf.
//!
//! ## Views
//!
//! [`LeafNode`] borrows a page immutably for reads; [`LeafNodeMut`] borrows
//! it mutably for in-place mutation. Both validate the page size and node
//! type once at construction, so the plain accessors can index without
//! re-checking.
//!
//! ## Search
//!
//! [`LeafNode::find`] binary-searches the sorted keys and returns either
//! the matching cell or the insertion position (the smallest index holding
//! a key greater than the target).
//!
//! ## Insertion
//!
//! [`LeafNodeMut::insert_at`] shifts the tail cells one slot right with a
//! single in-page copy and writes the new cell at the cursor position.
//! Splitting is coordinated a level up, in `tree`, because it touches
//! multiple pages.

use eyre::{ensure, Result};

use crate::config::{LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_KEY_SIZE, LEAF_NODE_MAX_CELLS, PAGE_SIZE};
use crate::row::Row;
use crate::storage::{LeafHeader, NodeHeader, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Found(u32),
    NotFound(u32),
}

#[derive(Debug)]
pub struct LeafNode<'a> {
    data: &'a [u8],
}

pub struct LeafNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(cell_num: u32) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num as usize * LEAF_NODE_CELL_SIZE
}

fn key_in_page(data: &[u8], cell_num: u32) -> u32 {
    let offset = cell_offset(cell_num);
    u32::from_le_bytes(
        data[offset..offset + LEAF_NODE_KEY_SIZE]
            .try_into()
            .expect("fixed-width slice"),
    )
}

impl<'a> LeafNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Leaf,
            "expected leaf node, got internal"
        );
        Ok(Self { data })
    }

    fn header(&self) -> &LeafHeader {
        LeafHeader::from_bytes(self.data).unwrap() // INVARIANT: page validated in from_page
    }

    pub fn num_cells(&self) -> u32 {
        self.header().num_cells()
    }

    pub fn next_leaf(&self) -> u32 {
        self.header().next_leaf()
    }

    pub fn is_root(&self) -> bool {
        self.header().common.is_root()
    }

    pub fn parent(&self) -> u32 {
        self.header().common.parent()
    }

    pub fn key_at(&self, cell_num: u32) -> Result<u32> {
        ensure!(
            cell_num < self.num_cells(),
            "cell index {} out of bounds (num_cells={})",
            cell_num,
            self.num_cells()
        );
        Ok(key_in_page(self.data, cell_num))
    }

    /// The serialized row of one cell.
    pub fn value_at(&self, cell_num: u32) -> Result<&'a [u8]> {
        ensure!(
            cell_num < self.num_cells(),
            "cell index {} out of bounds (num_cells={})",
            cell_num,
            self.num_cells()
        );
        let offset = cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
        Ok(&self.data[offset..offset + LEAF_NODE_CELL_SIZE - LEAF_NODE_KEY_SIZE])
    }

    /// Raw bytes of one cell (key and row together).
    pub fn cell_bytes(&self, cell_num: u32) -> Result<&'a [u8]> {
        ensure!(
            cell_num < self.num_cells(),
            "cell index {} out of bounds (num_cells={})",
            cell_num,
            self.num_cells()
        );
        let offset = cell_offset(cell_num);
        Ok(&self.data[offset..offset + LEAF_NODE_CELL_SIZE])
    }

    /// Largest key in the leaf.
    pub fn max_key(&self) -> Result<u32> {
        let num_cells = self.num_cells();
        ensure!(num_cells > 0, "empty leaf has no max key");
        Ok(key_in_page(self.data, num_cells - 1))
    }

    /// Binary search for a key: the matching cell index, or the position
    /// where the key belongs.
    pub fn find(&self, key: u32) -> SearchResult {
        let mut min_index = 0u32;
        let mut one_past_max_index = self.num_cells();

        while one_past_max_index != min_index {
            let index = (min_index + one_past_max_index) / 2;
            let key_at_index = key_in_page(self.data, index);
            if key == key_at_index {
                return SearchResult::Found(index);
            }
            if key < key_at_index {
                one_past_max_index = index;
            } else {
                min_index = index + 1;
            }
        }

        SearchResult::NotFound(min_index)
    }
}

impl<'a> LeafNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Leaf,
            "expected leaf node, got internal"
        );
        Ok(Self { data })
    }

    /// Initializes a page as an empty non-root leaf.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        LeafHeader::from_bytes_mut(data)?.init();
        Ok(Self { data })
    }

    fn header(&self) -> &LeafHeader {
        LeafHeader::from_bytes(self.data).unwrap() // INVARIANT: page validated at construction
    }

    fn header_mut(&mut self) -> &mut LeafHeader {
        LeafHeader::from_bytes_mut(self.data).unwrap() // INVARIANT: page validated at construction
    }

    pub fn num_cells(&self) -> u32 {
        self.header().num_cells()
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        self.header_mut().set_num_cells(num_cells);
    }

    pub fn next_leaf(&self) -> u32 {
        self.header().next_leaf()
    }

    pub fn set_next_leaf(&mut self, page_num: u32) {
        self.header_mut().set_next_leaf(page_num);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        self.header_mut().common.set_parent(page_num);
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.header_mut().common.set_root(is_root);
    }

    /// Writes a cell without touching the cell count. Used directly by the
    /// split redistribution, which fixes up counts afterwards.
    pub fn write_cell(&mut self, cell_num: u32, key: u32, row: &Row) -> Result<()> {
        ensure!(
            (cell_num as usize) < LEAF_NODE_MAX_CELLS,
            "cell index {} out of bounds (max {})",
            cell_num,
            LEAF_NODE_MAX_CELLS
        );
        let offset = cell_offset(cell_num);
        self.data[offset..offset + LEAF_NODE_KEY_SIZE].copy_from_slice(&key.to_le_bytes());
        row.serialize(&mut self.data[offset + LEAF_NODE_KEY_SIZE..offset + LEAF_NODE_CELL_SIZE]);
        Ok(())
    }

    /// Copies a raw cell (key and row) into position. Counterpart of
    /// [`LeafNode::cell_bytes`] for split redistribution.
    pub fn copy_cell_from(&mut self, cell_num: u32, cell: &[u8]) -> Result<()> {
        ensure!(
            (cell_num as usize) < LEAF_NODE_MAX_CELLS,
            "cell index {} out of bounds (max {})",
            cell_num,
            LEAF_NODE_MAX_CELLS
        );
        ensure!(
            cell.len() == LEAF_NODE_CELL_SIZE,
            "cell buffer size {} != {}",
            cell.len(),
            LEAF_NODE_CELL_SIZE
        );
        let offset = cell_offset(cell_num);
        self.data[offset..offset + LEAF_NODE_CELL_SIZE].copy_from_slice(cell);
        Ok(())
    }

    /// Inserts a cell at `cell_num`, shifting later cells one slot right.
    /// The caller guarantees the leaf is not full.
    pub fn insert_at(&mut self, cell_num: u32, key: u32, row: &Row) -> Result<()> {
        let num_cells = self.num_cells();
        ensure!(
            (num_cells as usize) < LEAF_NODE_MAX_CELLS,
            "leaf node is full"
        );
        ensure!(
            cell_num <= num_cells,
            "insert position {} out of bounds (num_cells={})",
            cell_num,
            num_cells
        );

        if cell_num < num_cells {
            let start = cell_offset(cell_num);
            let end = cell_offset(num_cells);
            self.data.copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
        }

        self.write_cell(cell_num, key, row)?;
        self.set_num_cells(num_cells + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_row(id: u32) -> Row {
        Row::new(id, &format!("user{}", id), &format!("person{}@example.com", id)).unwrap()
    }

    fn leaf_page() -> Vec<u8> {
        let mut page = vec![0u8; PAGE_SIZE];
        LeafNodeMut::init(&mut page).unwrap();
        page
    }

    #[test]
    fn init_produces_empty_leaf() {
        let page = leaf_page();
        let leaf = LeafNode::from_page(&page).unwrap();

        assert_eq!(leaf.num_cells(), 0);
        assert_eq!(leaf.next_leaf(), 0);
        assert!(!leaf.is_root());
    }

    #[test]
    fn from_page_rejects_internal_node() {
        let mut page = vec![0u8; PAGE_SIZE];
        // node_type byte 0 = internal
        assert!(LeafNode::from_page(&page).is_err());
        assert!(LeafNodeMut::from_page(&mut page).is_err());
    }

    #[test]
    fn insert_at_keeps_keys_sorted() {
        let mut page = leaf_page();
        {
            let mut leaf = LeafNodeMut::from_page(&mut page).unwrap();
            leaf.insert_at(0, 3, &test_row(3)).unwrap();
            leaf.insert_at(0, 1, &test_row(1)).unwrap();
            leaf.insert_at(1, 2, &test_row(2)).unwrap();
        }

        let leaf = LeafNode::from_page(&page).unwrap();
        assert_eq!(leaf.num_cells(), 3);
        assert_eq!(leaf.key_at(0).unwrap(), 1);
        assert_eq!(leaf.key_at(1).unwrap(), 2);
        assert_eq!(leaf.key_at(2).unwrap(), 3);
        assert_eq!(leaf.max_key().unwrap(), 3);
    }

    #[test]
    fn insert_shifts_existing_rows_intact() {
        let mut page = leaf_page();
        {
            let mut leaf = LeafNodeMut::from_page(&mut page).unwrap();
            leaf.insert_at(0, 10, &test_row(10)).unwrap();
            leaf.insert_at(1, 30, &test_row(30)).unwrap();
            leaf.insert_at(1, 20, &test_row(20)).unwrap();
        }

        let leaf = LeafNode::from_page(&page).unwrap();
        for (i, id) in [10u32, 20, 30].into_iter().enumerate() {
            let row = Row::deserialize(leaf.value_at(i as u32).unwrap()).unwrap();
            assert_eq!(row.id, id);
            assert_eq!(row.username(), format!("user{}", id));
        }
    }

    #[test]
    fn insert_rejects_full_leaf() {
        let mut page = leaf_page();
        let mut leaf = LeafNodeMut::from_page(&mut page).unwrap();
        for i in 0..LEAF_NODE_MAX_CELLS as u32 {
            leaf.insert_at(i, i, &test_row(i)).unwrap();
        }

        let result = leaf.insert_at(0, 100, &test_row(100));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("full"));
    }

    #[test]
    fn find_locates_existing_and_missing_keys() {
        let mut page = leaf_page();
        {
            let mut leaf = LeafNodeMut::from_page(&mut page).unwrap();
            for (i, key) in [10u32, 20, 30, 40].into_iter().enumerate() {
                leaf.insert_at(i as u32, key, &test_row(key)).unwrap();
            }
        }

        let leaf = LeafNode::from_page(&page).unwrap();
        assert_eq!(leaf.find(10), SearchResult::Found(0));
        assert_eq!(leaf.find(40), SearchResult::Found(3));
        assert_eq!(leaf.find(5), SearchResult::NotFound(0));
        assert_eq!(leaf.find(25), SearchResult::NotFound(2));
        assert_eq!(leaf.find(99), SearchResult::NotFound(4));
    }

    #[test]
    fn find_on_empty_leaf_returns_position_zero() {
        let page = leaf_page();
        let leaf = LeafNode::from_page(&page).unwrap();

        assert_eq!(leaf.find(1), SearchResult::NotFound(0));
    }

    #[test]
    fn accessors_reject_out_of_bounds_cells() {
        let page = leaf_page();
        let leaf = LeafNode::from_page(&page).unwrap();

        assert!(leaf.key_at(0).is_err());
        assert!(leaf.value_at(0).is_err());
        assert!(leaf.max_key().is_err());
    }
}
