// Thin re-export module: implementation is in `blockchain/core.rs`, split
// into block structure and linkage validation.

pub mod core;
pub use self::core::*;
