//! Streaming reader for the DMLOG instrumentation protocol
//!
//! Each protocol line looks like `<PREFIX> <KIND> <ARG>`. Lines whose first
//! token is not the prefix are skipped. `BLOCK_BEGIN`/`BLOCK_END` bracket a
//! block height; `BLOCK` and `TX` carry base64 payloads.

use super::payload::decode_payload;
use super::{DEFAULT_PREFIX, KIND_BLOCK, KIND_BLOCK_BEGIN, KIND_BLOCK_END, KIND_TX};
use crate::blockchain::Block;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use std::fmt;
use tokio::sync::mpsc;

/// One parsed protocol line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    BlockBegin(u64),
    BlockEnd(u64),
    Block(String),
    Tx(String),
}

/// What [`LogReader::read`] hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A `BLOCK_END` matched the open bracket at this height.
    BlockClosed(u64),
    Block(Block),
    Transaction(Transaction),
}

impl fmt::Display for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Decoded::BlockClosed(height) => write!(f, "closed block #{}", height),
            Decoded::Block(block) => write!(
                f,
                "block #{} {} ({} txs)",
                block.height,
                block.hash,
                block.transactions.len()
            ),
            Decoded::Transaction(tx) => write!(f, "{} tx {}", tx.tx_type, tx.hash),
        }
    }
}

/// Open-bracket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseCtx {
    pub height: u64,
}

pub struct LogReader {
    prefix: String,
    lines: mpsc::Receiver<String>,
    parse_ctx: Option<ParseCtx>,
    closed: bool,
}

impl LogReader {
    /// An empty `prefix` selects [`DEFAULT_PREFIX`].
    pub fn new(lines: mpsc::Receiver<String>, prefix: &str) -> Result<Self> {
        let prefix = if prefix.is_empty() {
            DEFAULT_PREFIX
        } else {
            prefix
        };

        if prefix.contains(char::is_whitespace) {
            return Err(ChainError::ConfigError(format!(
                "log prefix {:?} must not contain whitespace",
                prefix
            )));
        }

        Ok(LogReader {
            prefix: prefix.to_string(),
            lines,
            parse_ctx: None,
            closed: false,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Height of the currently open bracket, if any.
    pub fn open_height(&self) -> Option<u64> {
        self.parse_ctx.map(|ctx| ctx.height)
    }

    /// Pulls lines until one decodes to an object. `Ok(None)` means the
    /// source is exhausted (or the reader was closed).
    pub async fn read(&mut self) -> Result<Option<Decoded>> {
        if self.closed {
            return Ok(None);
        }

        while let Some(line) = self.lines.recv().await {
            if let Some(decoded) = self.process_line(&line)? {
                return Ok(Some(decoded));
            }
        }

        Ok(None)
    }

    /// Stops accepting lines. Safe to call more than once.
    pub fn close(&mut self) {
        self.lines.close();
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `Ok(None)` for lines that are not ours.
    pub fn parse_line(&self, line: &str) -> Result<Option<LogEntry>> {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some(self.prefix.as_str()) {
            return Ok(None);
        }

        let (kind, arg) = match (tokens.next(), tokens.next()) {
            (Some(kind), Some(arg)) => (kind, arg),
            _ => {
                return Err(ChainError::MalformedLine(format!(
                    "invalid log line format: {}",
                    line
                )))
            }
        };

        let entry = match kind {
            KIND_BLOCK_BEGIN => LogEntry::BlockBegin(parse_height(arg, line)?),
            KIND_BLOCK_END => LogEntry::BlockEnd(parse_height(arg, line)?),
            KIND_BLOCK => LogEntry::Block(arg.to_string()),
            KIND_TX => LogEntry::Tx(arg.to_string()),
            other => return Err(ChainError::UnsupportedKind(other.to_string())),
        };

        Ok(Some(entry))
    }

    /// Parses one line and applies it to the bracket state.
    pub fn process_line(&mut self, line: &str) -> Result<Option<Decoded>> {
        let entry = match self.parse_line(line)? {
            Some(entry) => entry,
            None => return Ok(None),
        };

        match entry {
            LogEntry::BlockBegin(height) => {
                if let Some(ctx) = self.parse_ctx {
                    if height <= ctx.height {
                        return Err(ChainError::ProtocolSequenceViolation(format!(
                            "unexpected begin marker at height {} while block {} is open",
                            height, ctx.height
                        )));
                    }
                }

                self.parse_ctx = Some(ParseCtx { height });
                Ok(None)
            }
            LogEntry::BlockEnd(height) => {
                let ctx = self.parse_ctx.ok_or_else(|| {
                    ChainError::ProtocolSequenceViolation(format!(
                        "unexpected end marker at height {} with no open block",
                        height
                    ))
                })?;

                if height != ctx.height {
                    return Err(ChainError::ProtocolSequenceViolation(format!(
                        "invalid end marker at height {}, open block is {}",
                        height, ctx.height
                    )));
                }

                self.parse_ctx = None;
                Ok(Some(Decoded::BlockClosed(height)))
            }
            LogEntry::Block(data) => Ok(Some(Decoded::Block(decode_payload(&data)?))),
            LogEntry::Tx(data) => Ok(Some(Decoded::Transaction(decode_payload(&data)?))),
        }
    }
}

fn parse_height(arg: &str, line: &str) -> Result<u64> {
    arg.parse::<u64>().map_err(|e| {
        ChainError::MalformedLine(format!("invalid height {:?} in {:?}: {}", arg, line, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_payload;
    use crate::engine::Engine;
    use std::time::Duration;

    fn reader() -> LogReader {
        let (_tx, rx) = mpsc::channel(1);
        LogReader::new(rx, "DMLOG").unwrap()
    }

    fn reader_with(lines: &[String]) -> LogReader {
        let (tx, rx) = mpsc::channel(lines.len().max(1));
        for line in lines {
            tx.try_send(line.clone()).unwrap();
        }
        LogReader::new(rx, "").unwrap()
    }

    async fn read_all(reader: &mut LogReader) -> Result<Vec<Decoded>> {
        let mut out = Vec::new();
        while let Some(decoded) = reader.read().await? {
            out.push(decoded);
        }
        Ok(out)
    }

    fn sample_block() -> Block {
        let mut engine = Engine::new(1).unwrap();
        engine.create_block()
    }

    #[test]
    fn test_default_prefix() {
        let (_tx, rx) = mpsc::channel(1);
        assert_eq!(LogReader::new(rx, "").unwrap().prefix(), "DMLOG");
    }

    #[test]
    fn test_whitespace_prefix_is_rejected() {
        let (_tx, rx) = mpsc::channel(1);
        assert!(LogReader::new(rx, "DM LOG").is_err());
    }

    #[test]
    fn test_parse_line_kinds() {
        let r = reader();
        assert_eq!(
            r.parse_line("DMLOG BLOCK_BEGIN 12").unwrap(),
            Some(LogEntry::BlockBegin(12))
        );
        assert_eq!(
            r.parse_line("DMLOG BLOCK_END 12").unwrap(),
            Some(LogEntry::BlockEnd(12))
        );
        assert_eq!(
            r.parse_line("DMLOG BLOCK abc=").unwrap(),
            Some(LogEntry::Block("abc=".to_string()))
        );
        assert_eq!(
            r.parse_line("DMLOG TX xyz").unwrap(),
            Some(LogEntry::Tx("xyz".to_string()))
        );
    }

    #[test]
    fn test_foreign_lines_are_ignored() {
        let mut r = reader();
        assert_eq!(r.process_line("OTHERTAG BLOCK xyz").unwrap(), None);
        assert_eq!(r.process_line("some node chatter").unwrap(), None);
        assert_eq!(r.process_line("").unwrap(), None);
        assert_eq!(r.process_line("DMLOGX BLOCK_END 1").unwrap(), None);
        assert_eq!(r.open_height(), None);
    }

    #[test]
    fn test_foreign_lines_inside_bracket_leave_it_open() {
        let mut r = reader();
        assert_eq!(r.process_line("DMLOG BLOCK_BEGIN 1").unwrap(), None);
        assert_eq!(r.process_line("OTHERTAG BLOCK xyz").unwrap(), None);
        assert_eq!(r.process_line("OTHERTAG BLOCK_END 1").unwrap(), None);
        assert_eq!(r.open_height(), Some(1));

        assert_eq!(
            r.process_line("DMLOG BLOCK_END 1").unwrap(),
            Some(Decoded::BlockClosed(1))
        );
        assert_eq!(r.open_height(), None);
    }

    #[test]
    fn test_too_few_tokens_is_malformed() {
        let r = reader();
        assert!(matches!(r.parse_line("DMLOG"), Err(ChainError::MalformedLine(_))));
        assert!(matches!(
            r.parse_line("DMLOG BLOCK_BEGIN"),
            Err(ChainError::MalformedLine(_))
        ));
    }

    #[test]
    fn test_bad_height_is_malformed() {
        let r = reader();
        assert!(matches!(
            r.parse_line("DMLOG BLOCK_BEGIN -1"),
            Err(ChainError::MalformedLine(_))
        ));
        assert!(matches!(
            r.parse_line("DMLOG BLOCK_END ten"),
            Err(ChainError::MalformedLine(_))
        ));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let r = reader();
        assert_eq!(
            r.parse_line("DMLOG RECEIPT 1").unwrap_err(),
            ChainError::UnsupportedKind("RECEIPT".to_string())
        );
    }

    #[test]
    fn test_overlapping_begin_is_rejected() {
        let mut r = reader();
        assert_eq!(r.process_line("DMLOG BLOCK_BEGIN 1").unwrap(), None);
        assert!(matches!(
            r.process_line("DMLOG BLOCK_BEGIN 1"),
            Err(ChainError::ProtocolSequenceViolation(_))
        ));
    }

    #[test]
    fn test_regressive_begin_is_rejected() {
        let mut r = reader();
        r.process_line("DMLOG BLOCK_BEGIN 5").unwrap();
        assert!(matches!(
            r.process_line("DMLOG BLOCK_BEGIN 4"),
            Err(ChainError::ProtocolSequenceViolation(_))
        ));
    }

    #[test]
    fn test_forward_begin_moves_bracket_including_gaps() {
        let mut r = reader();
        r.process_line("DMLOG BLOCK_BEGIN 1").unwrap();
        r.process_line("DMLOG BLOCK_BEGIN 2").unwrap();
        assert_eq!(r.open_height(), Some(2));
        r.process_line("DMLOG BLOCK_BEGIN 7").unwrap();
        assert_eq!(r.open_height(), Some(7));
    }

    #[test]
    fn test_orphan_end_is_rejected() {
        let mut r = reader();
        assert!(matches!(
            r.process_line("DMLOG BLOCK_END 1"),
            Err(ChainError::ProtocolSequenceViolation(_))
        ));
    }

    #[test]
    fn test_mismatched_end_is_rejected() {
        let mut r = reader();
        r.process_line("DMLOG BLOCK_BEGIN 1").unwrap();
        assert!(matches!(
            r.process_line("DMLOG BLOCK_END 2"),
            Err(ChainError::ProtocolSequenceViolation(_))
        ));
    }

    #[test]
    fn test_end_closes_bracket() {
        let mut r = reader();
        r.process_line("DMLOG BLOCK_BEGIN 3").unwrap();
        assert_eq!(
            r.process_line("DMLOG BLOCK_END 3").unwrap(),
            Some(Decoded::BlockClosed(3))
        );
        assert_eq!(r.open_height(), None);
        assert!(r.process_line("DMLOG BLOCK_END 3").is_err());
    }

    #[test]
    fn test_bad_payload_is_a_decode_error() {
        let mut r = reader();
        assert!(matches!(
            r.process_line("DMLOG BLOCK %%%"),
            Err(ChainError::PayloadDecodeError(_))
        ));
        assert!(matches!(
            r.process_line("DMLOG TX AAAA"),
            Err(ChainError::PayloadDecodeError(_))
        ));
    }

    #[tokio::test]
    async fn test_bracketed_sequence_decodes_in_order() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let block = sample_block();
            let mut engine = Engine::new(1).unwrap();
            let tx_block = (0..5).map(|_| engine.create_block()).last().unwrap();
            let tx = tx_block.transactions[0].clone();

            let lines = vec![
                "DMLOG BLOCK_BEGIN 1".to_string(),
                format!("DMLOG BLOCK {}", encode_payload(&block).unwrap()),
                "unrelated output".to_string(),
                format!("DMLOG TX {}", encode_payload(&tx).unwrap()),
                "DMLOG BLOCK_END 1".to_string(),
                "DMLOG BLOCK_BEGIN 2".to_string(),
                "DMLOG BLOCK_END 2".to_string(),
            ];
            let mut r = reader_with(&lines);

            let decoded = read_all(&mut r).await.unwrap();
            assert_eq!(
                decoded,
                vec![
                    Decoded::Block(block),
                    Decoded::Transaction(tx),
                    Decoded::BlockClosed(1),
                    Decoded::BlockClosed(2),
                ]
            );
        })
        .await
        .expect("test_bracketed_sequence_decodes_in_order timed out");
    }

    #[tokio::test]
    async fn test_read_surfaces_first_error() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let lines = vec![
                "DMLOG BLOCK_BEGIN 1".to_string(),
                "DMLOG BLOCK_END 1".to_string(),
                "DMLOG BLOCK_END 1".to_string(),
                "DMLOG BLOCK_BEGIN 2".to_string(),
            ];
            let mut r = reader_with(&lines);

            assert_eq!(r.read().await.unwrap(), Some(Decoded::BlockClosed(1)));
            assert!(matches!(
                r.read().await,
                Err(ChainError::ProtocolSequenceViolation(_))
            ));
        })
        .await
        .expect("test_read_surfaces_first_error timed out");
    }

    #[tokio::test]
    async fn test_end_of_stream_is_not_an_error() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let mut r = reader_with(&["DMLOG BLOCK_BEGIN 1".to_string()]);
            assert_eq!(r.read().await.unwrap(), None);
        })
        .await
        .expect("test_end_of_stream_is_not_an_error timed out");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        tokio::time::timeout(Duration::from_secs(5), async {
            let mut r = reader_with(&["DMLOG BLOCK_BEGIN 1".to_string()]);
            r.close();
            r.close();
            assert!(r.is_closed());
            assert_eq!(r.read().await.unwrap(), None);
        })
        .await
        .expect("test_close_is_idempotent timed out");
    }
}
