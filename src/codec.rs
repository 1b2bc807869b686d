//! Instrumentation log codec: payload encoding and the DMLOG line reader

pub mod log_reader;
pub mod payload;

pub use log_reader::*;
pub use payload::*;

/// Default tag distinguishing instrumentation lines from other output.
pub const DEFAULT_PREFIX: &str = "DMLOG";

pub const KIND_BLOCK_BEGIN: &str = "BLOCK_BEGIN";
pub const KIND_BLOCK_END: &str = "BLOCK_END";
pub const KIND_BLOCK: &str = "BLOCK";
pub const KIND_TX: &str = "TX";
