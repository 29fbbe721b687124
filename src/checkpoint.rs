//! Checkpoints - trusted starting blocks for sync.
//!
//! Full sync starts at genesis. Fast sync (api / blockchair) starts at the newest
//! embedded checkpoint, or at a newer one persisted by a previous session.

use bitcoin::hashes::Hash;
use bitcoin::BlockHash;
use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockHeader};
use crate::network::NetworkType;
use crate::storage::Storage;
use crate::sync::SyncMode;

// Block hashes in internal (little-endian) byte order.
const MAIN_GENESIS_HASH: [u8; 32] = [
    0x6f, 0xe2, 0x8c, 0x0a, 0xb6, 0xf1, 0xb3, 0x72, 0xc1, 0xa6, 0xa2, 0x46, 0xae, 0x63, 0xf7, 0x4f,
    0x93, 0x1e, 0x83, 0x65, 0xe1, 0x5a, 0x08, 0x9c, 0x68, 0xd6, 0x19, 0x00, 0x00, 0x00, 0x00, 0x00,
];
const TEST_GENESIS_HASH: [u8; 32] = [
    0x43, 0x49, 0x7f, 0xd7, 0xf8, 0x26, 0x95, 0x71, 0x08, 0xf4, 0xa3, 0x0f, 0xd9, 0xce, 0xc3, 0xae,
    0xba, 0x79, 0x97, 0x20, 0x84, 0xe9, 0x0e, 0xad, 0x01, 0xea, 0x33, 0x09, 0x00, 0x00, 0x00, 0x00,
];
const REGTEST_GENESIS_HASH: [u8; 32] = [
    0x06, 0x22, 0x6e, 0x46, 0x11, 0x1a, 0x0b, 0x59, 0xca, 0xaf, 0x12, 0x60, 0x43, 0xeb, 0x5b, 0xbf,
    0x28, 0xc3, 0x4f, 0x3a, 0x5e, 0x33, 0x2a, 0x1f, 0xc7, 0xb2, 0xb7, 0x3c, 0xf1, 0x88, 0x91, 0x0f,
];
const MAIN_840000_HASH: [u8; 32] = [
    0xa5, 0x83, 0xda, 0x1c, 0x3f, 0xf2, 0x9b, 0x68, 0x72, 0x48, 0xff, 0x73, 0x78, 0x22, 0xf8, 0xce,
    0x48, 0x27, 0x03, 0x3a, 0x28, 0x20, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];
const MAIN_839999_HASH: [u8; 32] = [
    0xab, 0x94, 0x84, 0x91, 0x07, 0x12, 0x65, 0xad, 0x55, 0x23, 0x51, 0xd0, 0xad, 0x62, 0x57, 0x45,
    0x66, 0x8d, 0xa5, 0x4b, 0x01, 0x72, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub block: Block,
}

impl Checkpoint {
    pub fn new(block: Block) -> Self { Self { block } }

    pub fn height(&self) -> u32 { self.block.height }

    pub fn genesis(network: NetworkType) -> Self {
        match network {
            NetworkType::MainNet => embedded(
                0,
                MAIN_GENESIS_HASH,
                [0; 32],
                1231006505,
                0x1d00ffff,
            ),
            NetworkType::TestNet => embedded(
                0,
                TEST_GENESIS_HASH,
                [0; 32],
                1296688602,
                0x1d00ffff,
            ),
            NetworkType::RegTest => embedded(
                0,
                REGTEST_GENESIS_HASH,
                [0; 32],
                1296688602,
                0x207fffff,
            ),
        }
    }

    /// Newest checkpoint shipped with the crate. Main net's sits mid-interval; its first
    /// retarget is range-checked by `LegacyDifficultyAdjustmentValidator`.
    pub fn last(network: NetworkType) -> Self {
        match network {
            NetworkType::MainNet => embedded(
                840_000,
                MAIN_840000_HASH,
                MAIN_839999_HASH,
                1713571767,
                0x17034219,
            ),
            // No post-genesis testnet/regtest header is embedded; fast sync starts at genesis.
            NetworkType::TestNet | NetworkType::RegTest => Self::genesis(network),
        }
    }

    pub fn resolve(network: NetworkType, sync_mode: SyncMode, storage: &dyn Storage) -> Self {
        if sync_mode == SyncMode::Full {
            return Self::genesis(network);
        }

        let embedded = Self::last(network);
        match storage.checkpoint() {
            Some(persisted) if persisted.height() > embedded.height() => persisted,
            _ => embedded,
        }
    }
}

fn embedded(height: u32, hash: [u8; 32], prev_hash: [u8; 32], timestamp: u32, bits: u32) -> Checkpoint {
    Checkpoint::new(Block::new(
        height,
        BlockHeader {
            hash: BlockHash::from_byte_array(hash),
            prev_hash: BlockHash::from_byte_array(prev_hash),
            timestamp,
            bits,
        },
    ))
}
