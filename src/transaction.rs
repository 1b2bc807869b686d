//! Transaction module: payload types carried inside blocks

pub mod types;

pub use types::*;
