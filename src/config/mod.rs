//! # Configuration Module
//!
//! This module centralizes every structural constant in tinysql. The on-disk
//! format is defined entirely by these values; scattering them across modules
//! risks interdependent offsets drifting apart, so they live here with their
//! derivations documented and enforced through compile-time assertions.
//!
//! ## Module Organization
//!
//! - [`constants`]: all layout values with dependency documentation

pub mod constants;
pub use constants::*;
