// Thin re-export module: implementation lives in `blockchain/core.rs`, split
// into chain management (`chain`) and integrity verification (`validation`).

pub mod core;
pub use core::*;
