//! Difficulty-chain validators with fixed legacy constants.

use std::sync::Arc;

use primitive_types::U256;

use super::{BlockValidator, BlockValidatorError, ChainedValidator, DifficultyEncoder};
use crate::block::Block;
use crate::storage::Storage;

pub const HEIGHT_INTERVAL: u32 = 2016;
pub const TARGET_SPACING: u32 = 600;
pub const TARGET_TIMESPAN: u32 = HEIGHT_INTERVAL * TARGET_SPACING;
pub const MAX_TARGET_BITS: u32 = 0x1d00ffff;

fn is_retarget_height(height: u32) -> bool {
    height % HEIGHT_INTERVAL == 0
}

/// Recomputes bits at every retarget height from the previous interval's elapsed time.
pub struct LegacyDifficultyAdjustmentValidator {
    encoder: DifficultyEncoder,
    storage: Arc<dyn Storage>,
}

impl LegacyDifficultyAdjustmentValidator {
    pub fn new(encoder: DifficultyEncoder, storage: Arc<dyn Storage>) -> Self {
        Self { encoder, storage }
    }

    /// Bits expected for the first block of a new interval.
    pub fn expected_bits(&self, previous: &Block, interval_start: &Block) -> Result<u32, BlockValidatorError> {
        let elapsed = previous.timestamp() as i64 - interval_start.timestamp() as i64;
        let timespan = elapsed.clamp((TARGET_TIMESPAN / 4) as i64, (TARGET_TIMESPAN * 4) as i64) as u64;
        self.adjusted_bits(previous.bits(), timespan)
    }

    /// Hardest and easiest bits a retarget from `previous` can produce.
    pub fn bits_bounds(&self, previous: &Block) -> Result<(u32, u32), BlockValidatorError> {
        let hardest = self.adjusted_bits(previous.bits(), (TARGET_TIMESPAN / 4) as u64)?;
        let easiest = self.adjusted_bits(previous.bits(), (TARGET_TIMESPAN * 4) as u64)?;
        Ok((hardest, easiest))
    }

    fn adjusted_bits(&self, bits: u32, timespan: u64) -> Result<u32, BlockValidatorError> {
        let max_target = self.encoder.decode_compact(MAX_TARGET_BITS)?;
        let target = self
            .encoder
            .decode_compact(bits)?
            .checked_mul(U256::from(timespan))
            .ok_or(super::CompactError::Overflow)?
            / U256::from(TARGET_TIMESPAN);

        Ok(self.encoder.encode_compact(target.min(max_target)))
    }

    /// The interval began below the checkpoint, so only the clamp range can be checked.
    fn validate_within_bounds(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        let (hardest, easiest) = self.bits_bounds(previous)?;
        let target = self.encoder.decode_compact(block.bits())?;
        let lower = self.encoder.decode_compact(hardest)?;
        let upper = self.encoder.decode_compact(easiest)?;
        if target < lower || target > upper {
            return Err(BlockValidatorError::RetargetOutOfRange {
                height: block.height,
                hardest,
                easiest,
                actual: block.bits(),
            });
        }
        Ok(())
    }

    fn below_checkpoint(&self, height: u32) -> bool {
        self.storage.checkpoint().is_some_and(|checkpoint| height < checkpoint.height())
    }
}

impl BlockValidator for LegacyDifficultyAdjustmentValidator {
    fn name(&self) -> &'static str { "legacy_difficulty_adjustment" }

    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        let start_height = block.height.saturating_sub(HEIGHT_INTERVAL);
        let interval_start = match self.storage.block(start_height) {
            Some(interval_start) => interval_start,
            None if self.below_checkpoint(start_height) => return self.validate_within_bounds(block, previous),
            None => return Err(BlockValidatorError::NoCheckpointBlock { height: start_height }),
        };

        let expected = self.expected_bits(previous, &interval_start)?;
        if expected != block.bits() {
            return Err(BlockValidatorError::NotDifficultyTransitionEqualBits {
                height: block.height,
                expected,
                actual: block.bits(),
            });
        }
        Ok(())
    }
}

impl ChainedValidator for LegacyDifficultyAdjustmentValidator {
    fn is_block_validatable(&self, block: &Block, _previous: &Block) -> bool {
        is_retarget_height(block.height)
    }
}

/// Main chain off-boundary: bits never change mid-interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitsValidator;

impl BlockValidator for BitsValidator {
    fn name(&self) -> &'static str { "bits" }

    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        if block.bits() != previous.bits() {
            return Err(BlockValidatorError::NotEqualBits {
                height: block.height,
                expected: previous.bits(),
                actual: block.bits(),
            });
        }
        Ok(())
    }
}

impl ChainedValidator for BitsValidator {
    fn is_block_validatable(&self, block: &Block, _previous: &Block) -> bool {
        !is_retarget_height(block.height)
    }
}

/// Test network off-boundary: the 20-minute minimum-difficulty exception.
pub struct LegacyTestNetDifficultyValidator {
    storage: Arc<dyn Storage>,
}

impl LegacyTestNetDifficultyValidator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl BlockValidator for LegacyTestNetDifficultyValidator {
    fn name(&self) -> &'static str { "testnet_min_difficulty" }

    fn validate(&self, block: &Block, previous: &Block) -> Result<(), BlockValidatorError> {
        if block.timestamp() > previous.timestamp().saturating_add(TARGET_SPACING * 2) {
            if block.bits() != MAX_TARGET_BITS {
                return Err(BlockValidatorError::NotEqualBits {
                    height: block.height,
                    expected: MAX_TARGET_BITS,
                    actual: block.bits(),
                });
            }
            return Ok(());
        }

        // Last block that was not mined under the exception.
        let mut cursor = *previous;
        while !is_retarget_height(cursor.height) && cursor.bits() == MAX_TARGET_BITS {
            let height = cursor.height - 1;
            cursor = self.storage.block(height).ok_or(BlockValidatorError::NoPreviousBlock { height })?;
        }

        if cursor.bits() != block.bits() {
            return Err(BlockValidatorError::NotEqualBits {
                height: block.height,
                expected: cursor.bits(),
                actual: block.bits(),
            });
        }
        Ok(())
    }
}

impl ChainedValidator for LegacyTestNetDifficultyValidator {
    fn is_block_validatable(&self, block: &Block, _previous: &Block) -> bool {
        !is_retarget_height(block.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::checkpoint::Checkpoint;
    use crate::network::NetworkType;
    use crate::storage::JsonFileStorage;
    use bitcoin::hashes::Hash;
    use bitcoin::BlockHash;

    fn block(height: u32, timestamp: u32, bits: u32) -> Block {
        Block::new(
            height,
            BlockHeader { hash: BlockHash::all_zeros(), prev_hash: BlockHash::all_zeros(), timestamp, bits },
        )
    }

    fn retarget_fixture(elapsed: u32) -> (LegacyDifficultyAdjustmentValidator, Block) {
        let storage = JsonFileStorage::in_memory();
        storage.add_blocks(&[block(2016, 1_000_000, MAX_TARGET_BITS)]).unwrap();
        let validator = LegacyDifficultyAdjustmentValidator::new(DifficultyEncoder, Arc::new(storage));
        (validator, block(4031, 1_000_000 + elapsed, MAX_TARGET_BITS))
    }

    #[test]
    fn exact_timespan_keeps_bits() {
        let (validator, previous) = retarget_fixture(TARGET_TIMESPAN);
        assert!(validator.validate(&block(4032, previous.timestamp() + 600, MAX_TARGET_BITS), &previous).is_ok());
    }

    #[test]
    fn fast_interval_clamps_to_quarter() {
        let (validator, previous) = retarget_fixture(TARGET_TIMESPAN / 10);
        let interval_start = block(2016, 1_000_000, MAX_TARGET_BITS);
        assert_eq!(validator.expected_bits(&previous, &interval_start).unwrap(), 0x1c3fffc0);

        let err = validator.validate(&block(4032, previous.timestamp() + 600, MAX_TARGET_BITS), &previous);
        assert!(matches!(err, Err(BlockValidatorError::NotDifficultyTransitionEqualBits { expected: 0x1c3fffc0, .. })));
        assert!(validator.validate(&block(4032, previous.timestamp() + 600, 0x1c3fffc0), &previous).is_ok());
    }

    #[test]
    fn slow_interval_capped_at_max_target() {
        let (validator, previous) = retarget_fixture(TARGET_TIMESPAN * 10);
        let interval_start = block(2016, 1_000_000, MAX_TARGET_BITS);
        assert_eq!(validator.expected_bits(&previous, &interval_start).unwrap(), MAX_TARGET_BITS);
    }

    #[test]
    fn missing_interval_start_is_reported() {
        let validator = LegacyDifficultyAdjustmentValidator::new(DifficultyEncoder, Arc::new(JsonFileStorage::in_memory()));
        let previous = block(4031, 0, MAX_TARGET_BITS);
        assert!(matches!(
            validator.validate(&block(4032, 600, MAX_TARGET_BITS), &previous),
            Err(BlockValidatorError::NoCheckpointBlock { height: 2016 })
        ));
    }

    #[test]
    fn first_retarget_after_mid_interval_checkpoint() {
        let checkpoint = Checkpoint::last(NetworkType::MainNet);
        assert_ne!(checkpoint.height() % HEIGHT_INTERVAL, 0);

        let storage = JsonFileStorage::in_memory();
        storage.save_checkpoint(&checkpoint).unwrap();
        storage.add_blocks(&[checkpoint.block]).unwrap();
        let validator = LegacyDifficultyAdjustmentValidator::new(DifficultyEncoder, Arc::new(storage));

        let retarget = (checkpoint.height() / HEIGHT_INTERVAL + 1) * HEIGHT_INTERVAL;
        assert_eq!(retarget, 840_672);
        let bits = checkpoint.block.bits();
        let previous = block(retarget - 1, checkpoint.block.timestamp() + 671 * 600, bits);
        let next = |bits| block(retarget, previous.timestamp() + 600, bits);

        assert!(validator.validate(&next(bits), &previous).is_ok());
        assert!(validator.validate(&next(0x17030000), &previous).is_ok());
        assert!(matches!(
            validator.validate(&next(MAX_TARGET_BITS), &previous),
            Err(BlockValidatorError::RetargetOutOfRange { height: 840_672, .. })
        ));
        assert!(matches!(
            validator.validate(&next(0x1700c000), &previous),
            Err(BlockValidatorError::RetargetOutOfRange { .. })
        ));
    }

    #[test]
    fn bits_must_not_change_mid_interval() {
        let previous = block(100, 0, 0x1b0404cb);
        assert!(BitsValidator.validate(&block(101, 600, 0x1b0404cb), &previous).is_ok());
        assert!(BitsValidator.validate(&block(101, 600, MAX_TARGET_BITS), &previous).is_err());
        assert!(!BitsValidator.is_block_validatable(&block(2016, 0, 0), &previous));
    }

    #[test]
    fn testnet_gap_allows_min_difficulty() {
        let validator = LegacyTestNetDifficultyValidator::new(Arc::new(JsonFileStorage::in_memory()));
        let previous = block(100, 10_000, 0x1b0404cb);
        assert!(validator.validate(&block(101, 10_000 + 1201, MAX_TARGET_BITS), &previous).is_ok());
        assert!(validator.validate(&block(101, 10_000 + 1201, 0x1b0404cb), &previous).is_err());
    }

    #[test]
    fn testnet_walks_back_past_min_difficulty_blocks() {
        let storage = JsonFileStorage::in_memory();
        storage
            .add_blocks(&[block(98, 9_000, 0x1b0404cb), block(99, 9_500, MAX_TARGET_BITS)])
            .unwrap();
        let validator = LegacyTestNetDifficultyValidator::new(Arc::new(storage));
        let previous = block(100, 10_000, MAX_TARGET_BITS);

        assert!(validator.validate(&block(101, 10_300, 0x1b0404cb), &previous).is_ok());
        assert!(matches!(
            validator.validate(&block(101, 10_300, MAX_TARGET_BITS), &previous),
            Err(BlockValidatorError::NotEqualBits { expected: 0x1b0404cb, .. })
        ));
    }

    #[test]
    fn testnet_walk_back_needs_stored_blocks() {
        let validator = LegacyTestNetDifficultyValidator::new(Arc::new(JsonFileStorage::in_memory()));
        let previous = block(100, 10_000, MAX_TARGET_BITS);
        assert!(matches!(
            validator.validate(&block(101, 10_300, 0x1b0404cb), &previous),
            Err(BlockValidatorError::NoPreviousBlock { height: 99 })
        ));
    }
}
