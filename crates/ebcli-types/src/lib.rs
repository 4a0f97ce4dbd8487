//! Foundation types and traits for ebcli.
//!
//! Shared by every ebcli crate: the error taxonomy, user configuration, the
//! device target address, the transport traits and register maps.

pub mod backend;
pub mod config;
pub mod error;
pub mod regmap;
pub mod target;
