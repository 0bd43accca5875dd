//! # Structural Constants
//!
//! All on-disk layout constants, grouped by the structure they describe.
//! Offsets are derived from field sizes so a change to any size ripples
//! through the dependent offsets automatically.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       ├─> LEAF_NODE_SPACE_FOR_CELLS (PAGE_SIZE - LEAF_NODE_HEADER_SIZE)
//!       │         │
//!       │         └─> LEAF_NODE_MAX_CELLS (13 with a 295-byte cell)
//!       │                   │
//!       │                   └─> LEAF_NODE_LEFT/RIGHT_SPLIT_COUNT (7 / 7)
//!       │
//!       └─> TABLE_MAX_PAGES (100) bounds the page cache and the file
//!
//! ROW_SIZE (291 bytes)
//!       │
//!       └─> LEAF_NODE_CELL_SIZE (key + row = 295)
//!
//! COMMON_NODE_HEADER_SIZE (6 bytes)
//!       │
//!       ├─> LEAF_NODE_HEADER_SIZE (14: common + num_cells + next_leaf)
//!       └─> INTERNAL_NODE_HEADER_SIZE (14: common + num_keys + right_child)
//! ```
//!
//! ## Critical Invariants
//!
//! Enforced by the compile-time assertions at the bottom of this file:
//!
//! 1. `ROW_SIZE == 291` (the fixed row layout)
//! 2. `LEAF_NODE_MAX_CELLS == 13` and the split counts partition
//!    `LEAF_NODE_MAX_CELLS + 1` cells
//! 3. All cells of a full node fit inside a page
//!
//! `INTERNAL_NODE_MAX_CELLS` is deliberately tiny (3) so that internal
//! splits are reachable with a handful of inserts.

/// Size of each database page in bytes. One page holds exactly one node.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of pages a table may occupy. Bounds both the page cache
/// and the database file.
pub const TABLE_MAX_PAGES: usize = 100;

/// Sentinel for an unset child pointer. An internal node's right child holds
/// this value only while a split is rearranging children.
pub const INVALID_PAGE_NUM: u32 = u32::MAX;

// ============================================================================
// ROW LAYOUT
// ============================================================================

/// Maximum username length in bytes (varchar(32)).
pub const USERNAME_SIZE: usize = 32;

/// Maximum email length in bytes (varchar(255)).
pub const EMAIL_SIZE: usize = 255;

/// Size of the row id (u32).
pub const ID_SIZE: usize = 4;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized size of one row.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

// ============================================================================
// COMMON NODE HEADER
// Shared prefix of every node: type byte, root flag, parent pointer.
// ============================================================================

pub const NODE_TYPE_SIZE: usize = 1;
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = 1;
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = 4;
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize =
    NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// ============================================================================
// LEAF NODE LAYOUT
// Header: common header, cell count, next-leaf pointer. Cells follow, each
// a u32 key and a serialized row.
// ============================================================================

pub const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
pub const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const LEAF_NODE_NEXT_LEAF_SIZE: usize = 4;
pub const LEAF_NODE_NEXT_LEAF_OFFSET: usize =
    LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
pub const LEAF_NODE_HEADER_SIZE: usize =
    COMMON_NODE_HEADER_SIZE + LEAF_NODE_NUM_CELLS_SIZE + LEAF_NODE_NEXT_LEAF_SIZE;

pub const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cells moved to the new (right) leaf during a split.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;

/// Cells kept in the old (left) leaf during a split.
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    LEAF_NODE_MAX_CELLS + 1 - LEAF_NODE_RIGHT_SPLIT_COUNT;

// ============================================================================
// INTERNAL NODE LAYOUT
// Header: common header, key count, right-child pointer. Cells follow, each
// a (child page, key) pair. A node with num_keys = k has k + 1 children.
// ============================================================================

pub const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
pub const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
pub const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
pub const INTERNAL_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE
    + INTERNAL_NODE_NUM_KEYS_SIZE
    + INTERNAL_NODE_RIGHT_CHILD_SIZE;

pub const INTERNAL_NODE_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// Kept deliberately small so internal splits are exercised with few rows.
pub const INTERNAL_NODE_MAX_CELLS: usize = 3;

// ============================================================================
// DERIVATION CHECKS
// ============================================================================

const _: () = assert!(ROW_SIZE == 291, "row layout changed: id(4) + username(32) + email(255)");

const _: () = assert!(COMMON_NODE_HEADER_SIZE == 6, "common node header derivation mismatch");

const _: () = assert!(LEAF_NODE_HEADER_SIZE == 14, "leaf header derivation mismatch");

const _: () = assert!(INTERNAL_NODE_HEADER_SIZE == 14, "internal header derivation mismatch");

const _: () = assert!(LEAF_NODE_MAX_CELLS == 13, "leaf cell capacity derivation mismatch");

const _: () = assert!(
    LEAF_NODE_LEFT_SPLIT_COUNT + LEAF_NODE_RIGHT_SPLIT_COUNT == LEAF_NODE_MAX_CELLS + 1,
    "leaf split counts must partition a full leaf plus the incoming cell"
);

const _: () = assert!(
    LEAF_NODE_HEADER_SIZE + LEAF_NODE_MAX_CELLS * LEAF_NODE_CELL_SIZE <= PAGE_SIZE,
    "a full leaf must fit inside one page"
);

const _: () = assert!(
    INTERNAL_NODE_HEADER_SIZE + (INTERNAL_NODE_MAX_CELLS + 1) * INTERNAL_NODE_CELL_SIZE
        <= PAGE_SIZE,
    "a full internal node (including the transient overflow cell) must fit inside one page"
);
