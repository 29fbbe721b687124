//! Address converters - text encodings ⇄ locking-script payloads.
//!
//! # Converters
//!
//! | Converter | Encoding | Script types |
//! |-----------|----------|--------------|
//! | `Base58AddressConverter` | base58check + version byte | P2PKH, P2SH, P2SH-P2WPKH |
//! | `SegWitBech32AddressConverter` | bech32 (v0) / bech32m (v1+) | P2WPKH, P2WSH, P2TR |
//!
//! `AddressConverterChain` tries converters in order; the first success wins.

mod base58;
mod bech32;
mod chain;
pub mod script;

use bitcoin::ScriptBuf;
use serde::{Deserialize, Serialize};

use crate::errors::AddressFormatError;

pub use self::base58::Base58AddressConverter;
pub use self::bech32::SegWitBech32AddressConverter;
pub use chain::AddressConverterChain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pkh,
    P2sh,
    /// P2WPKH nested in P2SH (BIP49).
    P2wpkhSh,
    P2wpkh,
    P2wsh,
    P2tr,
    Unknown,
}

impl ScriptType {
    /// Native witness program (bech32/bech32m encoded).
    pub fn is_segwit(&self) -> bool {
        matches!(self, ScriptType::P2wpkh | ScriptType::P2wsh | ScriptType::P2tr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Base58,
    SegWit { version: u8 },
}

/// Result of decoding (or encoding) an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedAddress {
    pub string: String,
    #[serde(with = "hex_bytes")]
    pub locking_script_payload: Vec<u8>,
    pub script_type: ScriptType,
    pub kind: AddressKind,
}

impl DecodedAddress {
    pub fn locking_script(&self) -> ScriptBuf {
        match self.kind {
            AddressKind::SegWit { version } => script::witness_script(version, &self.locking_script_payload),
            AddressKind::Base58 => script::locking_script(&self.locking_script_payload, self.script_type),
        }
        .unwrap_or_default()
    }
}

impl std::fmt::Display for DecodedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.string)
    }
}

/// One encoding strategy in a converter chain.
pub trait AddressConverter: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn convert(&self, address: &str) -> Result<DecodedAddress, AddressFormatError>;
    fn encode(&self, payload: &[u8], script_type: ScriptType) -> Result<DecodedAddress, AddressFormatError>;
}

pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(d)?;
        hex::decode(text).map_err(serde::de::Error::custom)
    }
}
