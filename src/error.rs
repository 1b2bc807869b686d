//! Error types for DMChain

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A prefixed line with too few tokens or an unparsable height.
    MalformedLine(String),
    /// First token after the prefix is not a known kind.
    UnsupportedKind(String),
    /// Begin/end markers out of order.
    ProtocolSequenceViolation(String),
    PayloadDecodeError(String),
    InvalidSeedBlock(String),
    InvalidBlockRate(u32),
    AlreadySubscribed,
    InvalidBlockLinkage(String),
    DatabaseError(String),
    ConfigError(String),
    IoError(String),
    BincodeError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::MalformedLine(msg) => write!(f, "Malformed log line: {}", msg),
            ChainError::UnsupportedKind(kind) => write!(f, "Unsupported kind: {}", kind),
            ChainError::ProtocolSequenceViolation(msg) => {
                write!(f, "Protocol sequence violation: {}", msg)
            }
            ChainError::PayloadDecodeError(msg) => write!(f, "Payload decode error: {}", msg),
            ChainError::InvalidSeedBlock(msg) => write!(f, "Invalid seed block: {}", msg),
            ChainError::InvalidBlockRate(rate) => {
                write!(f, "Invalid block rate {}: must be between 1 and 1000000000", rate)
            }
            ChainError::AlreadySubscribed => write!(f, "Block subscription already taken"),
            ChainError::InvalidBlockLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
            ChainError::BincodeError(msg) => write!(f, "Bincode error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<Box<bincode::ErrorKind>> for ChainError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        ChainError::BincodeError(err.to_string())
    }
}

impl From<rusqlite::Error> for ChainError {
    fn from(err: rusqlite::Error) -> Self {
        ChainError::DatabaseError(err.to_string())
    }
}

impl From<base64::DecodeError> for ChainError {
    fn from(err: base64::DecodeError) -> Self {
        ChainError::PayloadDecodeError(format!("invalid base64: {}", err))
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::DatabaseError(format!("invalid stored transactions: {}", err))
    }
}

impl From<toml::de::Error> for ChainError {
    fn from(err: toml::de::Error) -> Self {
        ChainError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
