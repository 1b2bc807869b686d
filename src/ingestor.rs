//! Ingestion pipeline: feeds instrumentation lines into a [`LogReader`] and
//! hands every decoded object to a handler.
//!
//! The first protocol violation aborts ingestion; nothing after a bad line
//! is delivered.

use crate::codec::{Decoded, LogReader};
use crate::config::IngestorConfig;
use crate::error::{ChainError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Where instrumentation lines come from.
pub enum LineFeed {
    Reader(Box<dyn AsyncBufRead + Unpin + Send>),
    /// Read one after another, in order.
    Files(Vec<PathBuf>),
}

impl LineFeed {
    pub fn stdin() -> Self {
        LineFeed::Reader(Box::new(BufReader::new(tokio::io::stdin())))
    }

    /// A single log file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        LineFeed::Files(vec![path.into()])
    }

    /// Every file in `dir` whose name ends with `pattern`, in lexical order.
    pub fn from_dir(dir: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ChainError::ConfigError(format!(
                "ingestor logs dir {} must exist",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(pattern));
            if path.is_file() && matches {
                files.push(path);
            }
        }
        files.sort();

        Ok(LineFeed::Files(files))
    }

    /// `logs_dir` when configured, stdin otherwise.
    pub fn from_config(config: &IngestorConfig) -> Result<Self> {
        match &config.logs_dir {
            Some(dir) => Self::from_dir(dir, &config.logs_pattern),
            None => Ok(Self::stdin()),
        }
    }

    /// Pushes every line into `lines`. Stops early, without error, once the
    /// receiving side is gone.
    async fn pump(self, lines: mpsc::Sender<String>) -> Result<u64> {
        let mut sent = 0;
        match self {
            LineFeed::Reader(reader) => {
                pump_reader(reader, &lines, &mut sent).await?;
            }
            LineFeed::Files(paths) => {
                for path in paths {
                    debug!(file = %path.display(), "reading instrumentation log");
                    let file = tokio::fs::File::open(&path).await?;
                    if !pump_reader(BufReader::new(file), &lines, &mut sent).await? {
                        break;
                    }
                }
            }
        }
        Ok(sent)
    }
}

/// Returns false if the receiver hung up.
async fn pump_reader<R: AsyncBufRead + Unpin>(
    reader: R,
    lines: &mpsc::Sender<String>,
    sent: &mut u64,
) -> Result<bool> {
    let mut reader_lines = reader.lines();
    while let Some(line) = reader_lines.next_line().await? {
        if lines.send(line).await.is_err() {
            return Ok(false);
        }
        *sent += 1;
    }
    Ok(true)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub blocks: u64,
    pub transactions: u64,
    pub closed_blocks: u64,
}

impl IngestStats {
    fn record(&mut self, decoded: &Decoded) {
        match decoded {
            Decoded::Block(_) => self.blocks += 1,
            Decoded::Transaction(_) => self.transactions += 1,
            Decoded::BlockClosed(_) => self.closed_blocks += 1,
        }
    }
}

pub struct Ingestor {
    prefix: String,
    line_buffer: usize,
}

impl Ingestor {
    pub fn new(config: &IngestorConfig) -> Self {
        Ingestor {
            prefix: config.prefix.clone(),
            line_buffer: config.line_buffer.max(1),
        }
    }

    pub async fn run<F>(&self, feed: LineFeed, mut handler: F) -> Result<IngestStats>
    where
        F: FnMut(&Decoded),
    {
        info!(prefix = %self.prefix, "starting ingestor");

        let (tx, rx) = mpsc::channel(self.line_buffer);
        let mut reader = LogReader::new(rx, &self.prefix)?;
        let feeder = tokio::spawn(feed.pump(tx));

        let mut stats = IngestStats::default();
        loop {
            match reader.read().await {
                Ok(Some(decoded)) => {
                    stats.record(&decoded);
                    handler(&decoded);
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "log reader error");
                    reader.close();
                    feeder.abort();
                    return Err(e);
                }
            }
        }

        let lines = feeder
            .await
            .map_err(|e| ChainError::IoError(format!("line feeder task failed: {}", e)))??;

        info!(
            lines,
            blocks = stats.blocks,
            transactions = stats.transactions,
            "stopped ingestor"
        );
        Ok(stats)
    }
}
