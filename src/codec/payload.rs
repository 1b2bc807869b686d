use crate::error::ChainError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes `message` with bincode and wraps it in standard base64.
pub fn encode_payload<T: Serialize>(message: &T) -> Result<String, ChainError> {
    let bytes = bincode::serialize(message)?;
    Ok(STANDARD.encode(bytes))
}

pub fn decode_payload<T: DeserializeOwned>(data: &str) -> Result<T, ChainError> {
    let bytes = STANDARD.decode(data)?;

    bincode::deserialize(&bytes)
        .map_err(|e| ChainError::PayloadDecodeError(format!("invalid message: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Block;
    use crate::transaction::Transaction;
    use base64::Engine as _;

    #[test]
    fn test_block_payload_survives_encoding() {
        let block = Block::new(1, None, vec![]);
        let encoded = encode_payload(&block).unwrap();
        assert!(!encoded.contains(char::is_whitespace));
        let decoded: Block = decode_payload(&encoded).unwrap();
        assert_eq!(decoded, block);
    }

    #[test]
    fn test_bad_base64_is_a_decode_error() {
        let err = decode_payload::<Block>("not base64!").unwrap_err();
        assert!(matches!(err, ChainError::PayloadDecodeError(_)));
    }

    #[test]
    fn test_truncated_message_is_a_decode_error() {
        let err = decode_payload::<Transaction>(&STANDARD.encode([1u8, 2, 3])).unwrap_err();
        assert!(matches!(err, ChainError::PayloadDecodeError(_)));
    }
}
