//! # Internal Macros
//!
//! ## le_accessors!
//!
//! Generates getter and setter methods for zerocopy struct fields stored as
//! little-endian `U32` wrapper types.
//!
//! ### Usage
//!
//! ```ignore
//! use zerocopy::little_endian::U32;
//!
//! #[repr(C)]
//! struct Header {
//!     num_cells: U32,
//!     next_leaf: U32,
//! }
//!
//! impl Header {
//!     le_accessors! {
//!         num_cells: u32,
//!         next_leaf: u32,
//!     }
//! }
//!
//! // Generates:
//! // pub fn num_cells(&self) -> u32 { self.num_cells.get() }
//! // pub fn set_num_cells(&mut self, val: u32) { self.num_cells = U32::new(val); }
//! // pub fn next_leaf(&self) -> u32 { self.next_leaf.get() }
//! // pub fn set_next_leaf(&mut self, val: u32) { self.next_leaf = U32::new(val); }
//! ```

/// Generates getter and setter methods for zerocopy little-endian fields.
#[macro_export]
macro_rules! le_accessors {
    ($($field:ident : u32),* $(,)?) => {
        $(
            ::paste::paste! {
                #[inline]
                pub fn $field(&self) -> u32 {
                    self.$field.get()
                }

                #[inline]
                pub fn [<set_ $field>](&mut self, val: u32) {
                    self.$field = ::zerocopy::little_endian::U32::new(val);
                }
            }
        )*
    };
}
