use crate::blockchain::core::chain::{Block, GENESIS_HEIGHT};
use crate::crypto::make_hash;
use crate::error::ChainError;

/// Checks that `next` can follow `prev`. With no predecessor `next` must be
/// the bootstrap block.
pub fn validate_link(prev: Option<&Block>, next: &Block) -> Result<(), ChainError> {
    match prev {
        Some(prev) => {
            if next.height != prev.height + 1 {
                return Err(ChainError::InvalidBlockLinkage(format!(
                    "Invalid block height. Expected {}, but got {}.",
                    prev.height + 1,
                    next.height
                )));
            }

            if next.prev_hash != prev.hash {
                return Err(ChainError::InvalidBlockLinkage(format!(
                    "Invalid previous block hash at height {}. Expected {}, but got {}.",
                    next.height, prev.hash, next.prev_hash
                )));
            }
        }
        None => {
            if next.height != GENESIS_HEIGHT {
                return Err(ChainError::InvalidBlockLinkage(format!(
                    "Chain is empty, expected height {}, but got {}.",
                    GENESIS_HEIGHT, next.height
                )));
            }

            let expected = make_hash(GENESIS_HEIGHT);
            if next.prev_hash != expected {
                return Err(ChainError::InvalidBlockLinkage(format!(
                    "Invalid bootstrap previous hash. Expected {}, but got {}.",
                    expected, next.prev_hash
                )));
            }
        }
    }

    Ok(())
}

/// Checks that `block` is a usable chain tip to resume production from.
pub fn validate_seed(block: &Block) -> Result<(), ChainError> {
    if block.height < GENESIS_HEIGHT {
        return Err(ChainError::InvalidSeedBlock(format!(
            "height must be at least {}, got {}",
            GENESIS_HEIGHT, block.height
        )));
    }

    let expected = make_hash(block.height);
    if block.hash != expected {
        return Err(ChainError::InvalidSeedBlock(format!(
            "hash at height {} should be {}, got {}",
            block.height, expected, block.hash
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_link() {
        let first = Block::new(1, None, vec![]);
        let second = Block::new(2, Some(&first), vec![]);
        assert!(validate_link(None, &first).is_ok());
        assert!(validate_link(Some(&first), &second).is_ok());
    }

    #[test]
    fn test_height_gap_is_rejected() {
        let first = Block::new(1, None, vec![]);
        let third = Block::new(3, Some(&first), vec![]);
        assert!(matches!(
            validate_link(Some(&first), &third),
            Err(ChainError::InvalidBlockLinkage(_))
        ));
    }

    #[test]
    fn test_wrong_prev_hash_is_rejected() {
        let first = Block::new(1, None, vec![]);
        let mut second = Block::new(2, Some(&first), vec![]);
        second.prev_hash = make_hash("elsewhere");
        assert!(validate_link(Some(&first), &second).is_err());
    }

    #[test]
    fn test_empty_chain_requires_bootstrap_block() {
        let first = Block::new(1, None, vec![]);
        let second = Block::new(2, Some(&first), vec![]);
        assert!(validate_link(None, &second).is_err());
    }

    #[test]
    fn test_validate_seed() {
        let seed = Block::new(7, None, vec![]);
        assert!(validate_seed(&seed).is_ok());

        let mut zero = seed.clone();
        zero.height = 0;
        assert!(matches!(validate_seed(&zero), Err(ChainError::InvalidSeedBlock(_))));

        let mut forged = seed;
        forged.hash = make_hash("forged");
        assert!(matches!(validate_seed(&forged), Err(ChainError::InvalidSeedBlock(_))));
    }
}
