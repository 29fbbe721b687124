//! Block validator assembly.
//!
//! ```text
//! BlockValidatorSet (all must pass, in order)
//!   ├── ProofOfWorkValidator
//!   └── BlockValidatorChain (first applicable decides)
//!         ├── LegacyDifficultyAdjustmentValidator   (height % 2016 == 0)
//!         └── BitsValidator                         (main)
//!             LegacyTestNetDifficultyValidator      (test / regtest)
//! ```

mod adjustment;
mod difficulty;
mod pow;

use std::sync::Arc;

use crate::block::Block;
use crate::network::NetworkType;
use crate::storage::Storage;

pub use adjustment::{
    BitsValidator, LegacyDifficultyAdjustmentValidator, LegacyTestNetDifficultyValidator, HEIGHT_INTERVAL,
    MAX_TARGET_BITS, TARGET_SPACING, TARGET_TIMESPAN,
};
pub use difficulty::{CompactError, DifficultyEncoder};
pub use pow::ProofOfWorkValidator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockValidatorError {
    #[error("block {height}: hash above target")]
    InvalidProofOfWork { height: u32 },
    #[error("block {height}: retarget bits {actual:#010x}, expected {expected:#010x}")]
    NotDifficultyTransitionEqualBits { height: u32, expected: u32, actual: u32 },
    #[error("block {height}: bits {actual:#010x}, expected {expected:#010x}")]
    NotEqualBits { height: u32, expected: u32, actual: u32 },
    #[error("block {height}: retarget bits {actual:#010x} outside {hardest:#010x}..={easiest:#010x}")]
    RetargetOutOfRange { height: u32, hardest: u32, easiest: u32, actual: u32 },
    #[error("interval start block {height} not in storage")]
    NoCheckpointBlock { height: u32 },
    #[error("previous block {height} not in storage")]
    NoPreviousBlock { height: u32 },
    #[error("compact bits: {0}")]
    Compact(#[from] CompactError),
}

pub trait BlockValidator: Send + Sync {
    fn name(&self) -> &'static str;
    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError>;
}

/// Member of a `BlockValidatorChain`.
pub trait ChainedValidator: BlockValidator {
    fn is_block_validatable(&self, block: &Block, previous: &Block) -> bool;
}

/// First validator that accepts the block decides; none applicable passes.
#[derive(Default)]
pub struct BlockValidatorChain {
    validators: Vec<Box<dyn ChainedValidator>>,
}

impl BlockValidatorChain {
    pub fn new() -> Self { Self::default() }

    pub fn add(mut self, validator: impl ChainedValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }
}

impl BlockValidator for BlockValidatorChain {
    fn name(&self) -> &'static str { "difficulty_chain" }

    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        match self.validators.iter().find(|v| v.is_block_validatable(block, previous)) {
            Some(validator) => validator.validate(block, previous),
            None => Ok(()),
        }
    }
}

/// Every validator runs in insertion order; the first rejection is returned.
#[derive(Default)]
pub struct BlockValidatorSet {
    validators: Vec<Box<dyn BlockValidator>>,
}

impl BlockValidatorSet {
    pub fn new() -> Self { Self::default() }

    pub fn add(mut self, validator: impl BlockValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    pub fn len(&self) -> usize { self.validators.len() }
    pub fn is_empty(&self) -> bool { self.validators.is_empty() }
}

impl BlockValidator for BlockValidatorSet {
    fn name(&self) -> &'static str { "validator_set" }

    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        self.validators.iter().try_for_each(|v| v.validate(block, previous))
    }
}

impl std::fmt::Debug for BlockValidatorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// The difficulty chain for `network`. Regtest shares the test network rules.
pub fn difficulty_chain(network: NetworkType, storage: Arc<dyn Storage>) -> BlockValidatorChain {
    let encoder = DifficultyEncoder;
    let chain = BlockValidatorChain::new().add(LegacyDifficultyAdjustmentValidator::new(encoder, storage.clone()));
    match network {
        NetworkType::MainNet => chain.add(BitsValidator),
        NetworkType::TestNet | NetworkType::RegTest => chain.add(LegacyTestNetDifficultyValidator::new(storage)),
    }
}

/// Proof of work, then the network's difficulty chain.
pub fn assemble(network: NetworkType, storage: Arc<dyn Storage>) -> BlockValidatorSet {
    BlockValidatorSet::new()
        .add(ProofOfWorkValidator::new(DifficultyEncoder))
        .add(difficulty_chain(network, storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::checkpoint::Checkpoint;
    use crate::storage::JsonFileStorage;
    use bitcoin::hashes::Hash;
    use bitcoin::BlockHash;

    fn storage() -> Arc<dyn Storage> {
        Arc::new(JsonFileStorage::in_memory())
    }

    #[test]
    fn chain_members_per_network() {
        assert_eq!(difficulty_chain(NetworkType::MainNet, storage()).names(), vec!["legacy_difficulty_adjustment", "bits"]);
        for network in [NetworkType::TestNet, NetworkType::RegTest] {
            assert_eq!(
                difficulty_chain(network, storage()).names(),
                vec!["legacy_difficulty_adjustment", "testnet_min_difficulty"]
            );
        }
    }

    #[test]
    fn set_runs_pow_first() {
        let set = assemble(NetworkType::MainNet, storage());
        assert_eq!(set.names(), vec!["proof_of_work", "difficulty_chain"]);
    }

    #[test]
    fn first_rejection_wins() {
        // Hash above target and bits changed mid-interval: proof of work reports first.
        let previous = Checkpoint::genesis(NetworkType::MainNet).block;
        let block = Block::new(
            1,
            BlockHeader { hash: BlockHash::from_byte_array([0xff; 32]), prev_hash: previous.header.hash, timestamp: 1231006505 + 600, bits: 0x1c00ffff },
        );
        let err = assemble(NetworkType::MainNet, storage()).validate(&block, &previous).unwrap_err();
        assert_eq!(err, BlockValidatorError::InvalidProofOfWork { height: 1 });
    }

    #[test]
    fn empty_chain_accepts() {
        let genesis = Checkpoint::genesis(NetworkType::MainNet).block;
        assert!(BlockValidatorChain::new().validate(&genesis, &genesis).is_ok());
    }
}
