//! DMChain - a toy block producer instrumented with the DMLOG line protocol
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Chain Data
//! - [`blockchain`] - Block structure and linkage validation
//! - [`transaction`] - Transaction, event and attribute types
//! - [`crypto`] - Deterministic identifiers (SHA-256)
//!
//! ## Production
//! - [`engine`] - Tick-driven block production engine
//! - [`node`] - Store, engine and instrumentation wired together
//! - [`persistence`] - Block store (SQLite or in-memory)
//!
//! ## Instrumentation Log
//! - [`instrumentation`] - Writes blocks as DMLOG lines
//! - [`codec`] - Payload encoding and the DMLOG reader
//! - [`ingestor`] - Feeds log lines through the reader
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Chain Data
// ============================================================================
pub mod blockchain;
pub mod crypto;
pub mod transaction;

// ============================================================================
// Production
// ============================================================================
pub mod engine;
pub mod node;
pub mod persistence;

// ============================================================================
// Instrumentation Log
// ============================================================================
pub mod codec;
pub mod ingestor;
pub mod instrumentation;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
