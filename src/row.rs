//! # Row Serialization
//!
//! The one record type the engine stores: a u32 id, a 32-byte username and a
//! 255-byte email, serialized to a fixed 291-byte layout.
//!
//! ## Serialized Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  --------
//! 0       4     id (u32, little-endian)
//! 4       32    username (NUL right-padded)
//! 36      255   email (NUL right-padded)
//! ```
//!
//! Strings are stored inline at full column width; the padding bytes stay on
//! disk and in deserialized rows. Presentation accessors ([`Row::username`],
//! [`Row::email`], `Display`) strip the trailing NULs.

use std::borrow::Cow;
use std::fmt;

use eyre::{ensure, Result};

use crate::config::{EMAIL_OFFSET, EMAIL_SIZE, ID_OFFSET, ROW_SIZE, USERNAME_OFFSET, USERNAME_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

impl Row {
    /// Builds a row, right-padding both strings to their column widths.
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self> {
        ensure!(
            username.len() <= USERNAME_SIZE,
            "username longer than {} bytes",
            USERNAME_SIZE
        );
        ensure!(email.len() <= EMAIL_SIZE, "email longer than {} bytes", EMAIL_SIZE);

        let mut username_buf = [0u8; USERNAME_SIZE];
        username_buf[..username.len()].copy_from_slice(username.as_bytes());
        let mut email_buf = [0u8; EMAIL_SIZE];
        email_buf[..email.len()].copy_from_slice(email.as_bytes());

        Ok(Self {
            id,
            username: username_buf,
            email: email_buf,
        })
    }

    /// Username with trailing padding stripped.
    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_padding(&self.username))
    }

    /// Email with trailing padding stripped.
    pub fn email(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(trim_padding(&self.email))
    }

    /// Writes the row into a 291-byte destination slice.
    pub fn serialize(&self, destination: &mut [u8]) {
        destination[ID_OFFSET..ID_OFFSET + 4].copy_from_slice(&self.id.to_le_bytes());
        destination[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]
            .copy_from_slice(&self.username);
        destination[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE].copy_from_slice(&self.email);
    }

    /// Reads a row back from a 291-byte source slice.
    pub fn deserialize(source: &[u8]) -> Result<Self> {
        ensure!(
            source.len() >= ROW_SIZE,
            "buffer too small for Row: {} < {}",
            source.len(),
            ROW_SIZE
        );

        let id = u32::from_le_bytes(source[ID_OFFSET..ID_OFFSET + 4].try_into().expect("fixed-width slice"));
        let mut username = [0u8; USERNAME_SIZE];
        username.copy_from_slice(&source[USERNAME_OFFSET..USERNAME_OFFSET + USERNAME_SIZE]);
        let mut email = [0u8; EMAIL_SIZE];
        email.copy_from_slice(&source[EMAIL_OFFSET..EMAIL_OFFSET + EMAIL_SIZE]);

        Ok(Self { id, username, email })
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {} {})", self.id, self.username(), self.email())
    }
}

fn trim_padding(field: &[u8]) -> &[u8] {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &field[..end]
}
