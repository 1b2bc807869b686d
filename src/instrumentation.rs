//! Writer side of the DMLOG instrumentation protocol
//!
//! Mirrors what [`crate::codec::LogReader`] consumes. A disabled instance
//! writes nothing.

use crate::blockchain::Block;
use crate::codec::{encode_payload, KIND_BLOCK, KIND_BLOCK_BEGIN, KIND_BLOCK_END, KIND_TX};
use crate::config::InstrumentationConfig;
use crate::error::Result;
use crate::transaction::Transaction;
use std::io::Write;

pub struct Instrumentation<W: Write> {
    prefix: String,
    sink: Option<W>,
}

impl<W: Write> Instrumentation<W> {
    pub fn new(config: &InstrumentationConfig, sink: W) -> Self {
        Instrumentation {
            prefix: config.prefix.clone(),
            sink: config.enabled.then_some(sink),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn block_begin(&mut self, height: u64) -> Result<()> {
        self.write_line(KIND_BLOCK_BEGIN, &height.to_string())
    }

    pub fn block(&mut self, block: &Block) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let payload = encode_payload(block)?;
        self.write_line(KIND_BLOCK, &payload)
    }

    pub fn transaction(&mut self, tx: &Transaction) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let payload = encode_payload(tx)?;
        self.write_line(KIND_TX, &payload)
    }

    pub fn block_end(&mut self, height: u64) -> Result<()> {
        self.write_line(KIND_BLOCK_END, &height.to_string())
    }

    /// Writes the full bracket for `block` and flushes.
    pub fn emit_block(&mut self, block: &Block) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        self.block_begin(block.height)?;
        self.block(block)?;
        for tx in &block.transactions {
            self.transaction(tx)?;
        }
        self.block_end(block.height)?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Gives the sink back, if instrumentation was enabled.
    pub fn into_inner(self) -> Option<W> {
        self.sink
    }

    fn write_line(&mut self, kind: &str, arg: &str) -> Result<()> {
        if let Some(sink) = self.sink.as_mut() {
            writeln!(sink, "{} {} {}", self.prefix, kind, arg)?;
        }
        Ok(())
    }
}
