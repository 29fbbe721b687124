use super::{BlockValidator, BlockValidatorError, DifficultyEncoder};
use crate::block::Block;

/// Header hash must not exceed the target its own bits encode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProofOfWorkValidator {
    encoder: DifficultyEncoder,
}

impl ProofOfWorkValidator {
    pub fn new(encoder: DifficultyEncoder) -> Self {
        Self { encoder }
    }
}

impl BlockValidator for ProofOfWorkValidator {
    fn name(&self) -> &'static str { "proof_of_work" }

    fn validate(&self, block: &Block, _previous: &Block) -> Result<(), BlockValidatorError> {
        if self.encoder.meets_target(&block.hash_le_bytes(), block.bits())? {
            Ok(())
        } else {
            Err(BlockValidatorError::InvalidProofOfWork { height: block.height })
        }
    }
}
