//! # Statement Preparation
//!
//! Turns a line of REPL input into a typed [`Statement`]. The grammar is
//! deliberately tiny and whitespace-delimited:
//!
//! ```text
//! insert <id> <username> <email>
//! select
//! ```
//!
//! Every way a statement can be malformed maps to one [`PrepareError`]
//! variant whose `Display` text is the exact message the REPL prints.

use thiserror::Error;

use crate::config::{EMAIL_SIZE, USERNAME_SIZE};
use crate::row::Row;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(Row),
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error("Unrecognised Command: {0}")]
    Unrecognized(String),
    #[error("Syntax error. couldn't parse statement")]
    Syntax,
    #[error("Syntax error. syntax too long")]
    TooLong,
    #[error("Syntax error. illegal id")]
    IllegalId,
}

/// Parses one trimmed input line into a statement.
pub fn prepare(input: &str) -> Result<Statement, PrepareError> {
    if input.starts_with("insert") {
        return prepare_insert(input);
    }
    if input.starts_with("select") {
        return Ok(Statement::Select);
    }
    Err(PrepareError::Unrecognized(input.to_string()))
}

fn prepare_insert(input: &str) -> Result<Statement, PrepareError> {
    let parts: Vec<&str> = input.split_whitespace().collect();

    if parts.len() < 4 {
        return Err(PrepareError::Syntax);
    }
    if parts.len() > 4 {
        return Err(PrepareError::TooLong);
    }

    let id: u32 = parts[1].parse().map_err(|_| PrepareError::IllegalId)?;

    let username = parts[2];
    let email = parts[3];

    if username.len() > USERNAME_SIZE || email.len() > EMAIL_SIZE {
        return Err(PrepareError::TooLong);
    }

    let row = Row::new(id, username, email).map_err(|_| PrepareError::TooLong)?;
    Ok(Statement::Insert(row))
}
