//! Engine plugins: the Hodler CSV time-lock plugin and its median-time helper.

use std::sync::Arc;

use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_CSV, OP_DROP, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use bitcoin::script::Builder;
use bitcoin::secp256k1::PublicKey;
use bitcoin::{CompressedPublicKey, PubkeyHash, ScriptBuf};

use crate::address::{AddressConverterChain, ScriptType};
use crate::block::Block;
use crate::errors::AddressFormatError;
use crate::storage::Storage;

const MEDIAN_TIME_SPAN: u32 = 11;

/// Median time past from stored block timestamps.
#[derive(Clone)]
pub struct BlockMedianTimeHelper {
    storage: Arc<dyn Storage>,
    approximate: bool,
}

impl BlockMedianTimeHelper {
    /// `approximate` falls back to the block's own timestamp when the window is incomplete
    /// (blockchair-assisted sync stores sparse headers).
    pub fn new(storage: Arc<dyn Storage>, approximate: bool) -> Self {
        Self { storage, approximate }
    }

    pub fn is_approximate(&self) -> bool { self.approximate }

    pub fn median_time_past(&self) -> Option<u32> {
        self.storage.last_block().and_then(|block| self.median_time_past_at(&block))
    }

    pub fn median_time_past_at(&self, block: &Block) -> Option<u32> {
        let from = block.height.saturating_sub(MEDIAN_TIME_SPAN - 1);
        let mut timestamps = self.storage.timestamps(from, block.height);
        let expected = (block.height - from + 1) as usize;

        if timestamps.len() < expected {
            return self.approximate.then(|| block.timestamp());
        }
        timestamps.sort_unstable();
        Some(timestamps[timestamps.len() / 2])
    }
}

impl std::fmt::Debug for BlockMedianTimeHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockMedianTimeHelper").field("approximate", &self.approximate).finish()
    }
}

/// Relative lock periods, in 512-second units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockTimeInterval {
    Hour,
    Month,
    HalfYear,
    Year,
}

impl LockTimeInterval {
    pub const ALL: [LockTimeInterval; 4] =
        [LockTimeInterval::Hour, LockTimeInterval::Month, LockTimeInterval::HalfYear, LockTimeInterval::Year];

    pub fn units(&self) -> u16 {
        match self {
            LockTimeInterval::Hour => 7,
            LockTimeInterval::Month => 5063,
            LockTimeInterval::HalfYear => 30881,
            LockTimeInterval::Year => 61593,
        }
    }

    /// nSequence with the time-based flag (bit 22) set.
    pub fn sequence(&self) -> u32 {
        SEQUENCE_TYPE_FLAG | self.units() as u32
    }
}

const SEQUENCE_TYPE_FLAG: u32 = 1 << 22;

/// `<seq> OP_CSV OP_DROP OP_DUP OP_HASH160 <pkh> OP_EQUALVERIFY OP_CHECKSIG`
pub fn csv_redeem_script(interval: LockTimeInterval, key_hash: PubkeyHash) -> ScriptBuf {
    Builder::new()
        .push_int(i64::from(interval.sequence()))
        .push_opcode(OP_CSV)
        .push_opcode(OP_DROP)
        .push_opcode(OP_DUP)
        .push_opcode(OP_HASH160)
        .push_slice(key_hash)
        .push_opcode(OP_EQUALVERIFY)
        .push_opcode(OP_CHECKSIG)
        .into_script()
}

/// Tracks CSV time-locked P2SH outputs paying to wallet keys.
#[derive(Debug, Clone)]
pub struct HodlerPlugin {
    address_converter: AddressConverterChain,
    median_time: BlockMedianTimeHelper,
}

impl HodlerPlugin {
    pub const NAME: &'static str = "hodler";

    pub fn new(address_converter: AddressConverterChain, median_time: BlockMedianTimeHelper) -> Self {
        Self { address_converter, median_time }
    }

    pub fn median_time(&self) -> &BlockMedianTimeHelper { &self.median_time }

    /// P2SH addresses of every lock period for `public_key`.
    pub fn restore_addresses(&self, public_key: &PublicKey) -> Result<Vec<String>, AddressFormatError> {
        let key_hash = CompressedPublicKey(*public_key).pubkey_hash();
        LockTimeInterval::ALL
            .iter()
            .map(|interval| {
                let script_hash = csv_redeem_script(*interval, key_hash).script_hash();
                Ok(self.address_converter.encode(&script_hash.to_byte_array(), ScriptType::P2sh)?.string)
            })
            .collect()
    }
}

/// Plugins attached to an engine.
#[derive(Debug, Clone)]
pub enum Plugin {
    Hodler(HodlerPlugin),
}

impl Plugin {
    pub fn name(&self) -> &'static str {
        match self {
            Plugin::Hodler(_) => HodlerPlugin::NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::network::NetworkType;
    use crate::storage::JsonFileStorage;
    use bitcoin::BlockHash;

    fn block(height: u32, timestamp: u32) -> Block {
        Block::new(
            height,
            BlockHeader { hash: BlockHash::all_zeros(), prev_hash: BlockHash::all_zeros(), timestamp, bits: 0x1d00ffff },
        )
    }

    fn storage_with(heights: std::ops::RangeInclusive<u32>) -> Arc<dyn Storage> {
        let storage = JsonFileStorage::in_memory();
        let blocks: Vec<_> = heights.map(|h| block(h, 1_000 + h * 600 + (h % 3) * 50)).collect();
        storage.add_blocks(&blocks).unwrap();
        Arc::new(storage)
    }

    #[test]
    fn median_of_last_eleven() {
        let storage = storage_with(0..=20);
        let helper = BlockMedianTimeHelper::new(storage.clone(), false);
        let mut window: Vec<u32> = storage.timestamps(10, 20);
        window.sort_unstable();
        assert_eq!(helper.median_time_past(), Some(window[5]));
    }

    #[test]
    fn incomplete_window_exact_vs_approximate() {
        let storage = storage_with(15..=20);
        let last = storage.last_block().unwrap();
        assert_eq!(BlockMedianTimeHelper::new(storage.clone(), false).median_time_past(), None);
        assert_eq!(BlockMedianTimeHelper::new(storage, true).median_time_past(), Some(last.timestamp()));
    }

    #[test]
    fn sequences_have_time_flag() {
        assert_eq!(LockTimeInterval::Hour.sequence(), 0x0040_0007);
        assert_eq!(LockTimeInterval::Year.sequence(), 0x0040_0000 | 61593);
    }

    #[test]
    fn redeem_script_layout() {
        let script = csv_redeem_script(LockTimeInterval::Hour, PubkeyHash::from_byte_array([0x11; 20]));
        let script = script.as_bytes();
        assert_eq!(&script[..9], &[0x03, 0x07, 0x00, 0x40, 0xb2, 0x75, 0x76, 0xa9, 0x14]);
        assert_eq!(script.len(), 9 + 20 + 2);
        assert_eq!(&script[29..], &[0x88, 0xac]);
    }

    #[test]
    fn restore_addresses_are_distinct_p2sh() {
        let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::in_memory());
        let plugin = HodlerPlugin::new(
            AddressConverterChain::for_network(NetworkType::MainNet.identity()),
            BlockMedianTimeHelper::new(storage, false),
        );
        let secp = bitcoin::secp256k1::Secp256k1::new();
        let secret = bitcoin::secp256k1::SecretKey::from_slice(&[0x42; 32]).unwrap();
        let public_key = PublicKey::from_secret_key(&secp, &secret);

        let addresses = plugin.restore_addresses(&public_key).unwrap();
        assert_eq!(addresses.len(), 4);
        assert!(addresses.iter().all(|a| a.starts_with('3')));
        let unique: std::collections::HashSet<_> = addresses.iter().collect();
        assert_eq!(unique.len(), 4);
    }
}
