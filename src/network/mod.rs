//! Network identity - immutable per-chain constants.
//!
//! Closed set of three chains; each maps to one static record.

mod params;

use serde::{Deserialize, Serialize};

pub use params::{MAIN_NET, REG_TEST, TEST_NET};

/// Constants describing one Bitcoin chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub name: &'static str,
    pub pub_key_hash: u8,
    pub private_key: u8,
    pub script_hash: u8,
    pub bech32_prefix: &'static str,
    pub extended_public_version: u32,
    pub extended_private_version: u32,
    pub magic: u32,
    pub default_port: u16,
    pub coin_type: u32,
    pub dns_seeds: &'static [&'static str],
    /// Satoshis per kvB.
    pub dust_relay_fee: u64,
    pub api_sync_eligible: bool,
    /// Blockchair chain path segment; empty when the chain has none.
    pub remote_chain_id: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkType {
    #[default]
    MainNet,
    TestNet,
    RegTest,
}

impl NetworkType {
    pub const ALL: [NetworkType; 3] = [NetworkType::MainNet, NetworkType::TestNet, NetworkType::RegTest];

    pub fn identity(&self) -> &'static NetworkIdentity {
        match self {
            NetworkType::MainNet => &MAIN_NET,
            NetworkType::TestNet => &TEST_NET,
            NetworkType::RegTest => &REG_TEST,
        }
    }

    /// Stable name used in storage file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::MainNet => "mainNet",
            NetworkType::TestNet => "testNet",
            NetworkType::RegTest => "regTest",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Some(NetworkType::MainNet),
            "testnet" | "test" => Some(NetworkType::TestNet),
            "regtest" | "reg" => Some(NetworkType::RegTest),
            _ => None,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, NetworkType::MainNet)
    }

    /// Network kind for BIP32 serialization (xprv vs tprv).
    pub fn kind(&self) -> bitcoin::NetworkKind {
        if self.is_main() { bitcoin::NetworkKind::Main } else { bitcoin::NetworkKind::Test }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_network_maps_to_distinct_record() {
        let main = NetworkType::MainNet.identity();
        let test = NetworkType::TestNet.identity();
        let reg = NetworkType::RegTest.identity();
        assert_ne!(main, test);
        assert_ne!(test, reg);
        assert_ne!(main.magic, test.magic);
        assert_ne!(test.magic, reg.magic);
        assert_ne!(test.bech32_prefix, reg.bech32_prefix);
    }

    #[test]
    fn documented_bitcoin_values() {
        let main = NetworkType::MainNet.identity();
        assert_eq!(main.default_port, 8333);
        assert_eq!(main.coin_type, 0);
        assert_eq!(main.dust_relay_fee, 3000);
        assert_eq!(main.magic, 0xF9BEB4D9);
        assert_eq!((main.pub_key_hash, main.script_hash, main.private_key), (0x00, 0x05, 0x80));
        assert_eq!(main.extended_public_version, 0x0488B21E);
        assert_eq!(main.extended_private_version, 0x0488ADE4);

        let test = NetworkType::TestNet.identity();
        assert_eq!(test.default_port, 18333);
        assert_eq!(test.coin_type, 1);
        assert_eq!(test.dust_relay_fee, 3000);
        assert_eq!(test.bech32_prefix, "tb");

        let reg = NetworkType::RegTest.identity();
        assert_eq!(reg.default_port, 18444);
        assert_eq!(reg.coin_type, 1);
        assert_eq!(reg.dust_relay_fee, 3000);
        assert_eq!(reg.bech32_prefix, "bcrt");
        assert!(!reg.api_sync_eligible);
        assert!(reg.remote_chain_id.is_empty());
    }

    #[test]
    fn network_names_round_trip() {
        for network in NetworkType::ALL {
            assert_eq!(NetworkType::from_str(network.as_str()), Some(network));
        }
        assert_eq!(NetworkType::from_str("signet"), None);
    }
}
