//! Block header data consumed by checkpoints and validators.

use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};

/// Header fields the validators read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: BlockHash,
    pub prev_hash: BlockHash,
    pub timestamp: u32,
    pub bits: u32,
}

/// Header at a known height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u32,
    pub header: BlockHeader,
}

impl Block {
    pub fn new(height: u32, header: BlockHeader) -> Self {
        Self { height, header }
    }

    pub fn timestamp(&self) -> u32 { self.header.timestamp }
    pub fn bits(&self) -> u32 { self.header.bits }

    /// Hash bytes in internal (little-endian) order, as compared against targets.
    pub fn hash_le_bytes(&self) -> [u8; 32] {
        self.header.hash.to_byte_array()
    }
}
