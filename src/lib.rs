//! # tinysql - A Single-Table Database Engine
//!
//! tinysql is a small embedded database that accepts typed `insert` and
//! `select` statements on a fixed schema, persists rows in a paged file, and
//! keeps them sorted in a disk-resident B+tree keyed by an unsigned 32-bit
//! identifier.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        REPL (cli + bin)             │
//! ├─────────────────────────────────────┤
//! │   Statement preparation             │
//! │   (insert/select parsing)           │
//! ├─────────────────────────────────────┤
//! │     Table / Executor (Table)        │
//! ├─────────────────────────────────────┤
//! │      B+Tree Index (btree)           │
//! ├─────────────────────────────────────┤
//! │   Row Serialization (row)           │
//! ├─────────────────────────────────────┤
//! │   Storage Layer (Pager)             │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## File Layout
//!
//! A database is a single file of contiguous 4KB pages. Page 0 always holds
//! the root node. Each page contains exactly one B+tree node, either a leaf
//! (rows keyed by id) or an internal node (separator keys and child page
//! pointers). All multi-byte integers are little-endian. There is no file
//! header, version field, or checksum.
//!
//! ## Module Overview
//!
//! - [`storage`]: the page cache over positional file I/O, plus on-page
//!   header definitions
//! - [`btree`]: leaf and internal node views and the tree operations
//!   (lookup, ordered insert, splits, root creation, leaf-chain iteration)
//! - [`row`]: fixed-width row serialization
//! - [`table`]: the executor facade (`open`, `insert`, `rows`, diagnostics)
//! - [`statement`]: statement preparation for the REPL
//! - [`cli`]: the interactive shell

#[macro_use]
mod macros;

pub mod btree;
pub mod cli;
pub mod config;
pub mod row;
pub mod statement;
pub mod storage;
pub mod table;

pub use row::Row;
pub use statement::{prepare, PrepareError, Statement};
pub use table::{ExecuteError, Table};
