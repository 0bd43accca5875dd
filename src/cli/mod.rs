//! # CLI Module
//!
//! The interactive shell: a rustyline-driven REPL over one open [`Table`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI Entry Point                        │
//! │                     (bin/tinysql.rs)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                         REPL Loop                           │
//! │  - Reads input via rustyline                                │
//! │  - Dispatches meta-commands vs statements                   │
//! │  - Routes recoverable errors to one-line messages           │
//! ├─────────────────────────────────────────────────────────────┤
//! │     Meta-commands        │          History                 │
//! │  (.exit, .btree,         │  Persistent, ~/.tinysql_history  │
//! │   .constants)            │  or $TINYSQL_HISTORY             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Meta-Commands
//!
//! | Command       | Description                                 |
//! |---------------|---------------------------------------------|
//! | `.exit`       | Flush, close the database, and quit         |
//! | `.btree`      | Print the tree structure                    |
//! | `.constants`  | Print the structural constants              |
//!
//! Anything else starting with `.` prints `Unrecognised Command: <input>`.
//!
//! ## Module Organization
//!
//! - `repl`: the read-eval-print loop
//! - `commands`: meta-command dispatch
//! - `history`: history file path resolution
//!
//! [`Table`]: crate::Table

pub mod commands;
pub mod history;
pub mod repl;

pub use repl::Repl;
