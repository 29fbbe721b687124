//! Key material a wallet session is built from.

mod extended;

use serde::Serialize;

use crate::address::{AddressConverterChain, DecodedAddress, ScriptType};
use crate::errors::{AddressFormatError, KitResult};
use crate::network::NetworkType;
use crate::purpose::{KeyScope, Purpose};

pub use extended::{ExtendedKey, ExtendedKeyVersion, MAX_SEED_LEN, MIN_SEED_LEN};

/// A watched address standing in for a public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchAddressPublicKey {
    pub address: String,
    #[serde(serialize_with = "crate::address::hex_bytes::serialize")]
    pub payload: Vec<u8>,
    pub script_type: ScriptType,
}

impl WatchAddressPublicKey {
    pub fn new(decoded: DecodedAddress) -> Result<Self, AddressFormatError> {
        if decoded.script_type == ScriptType::Unknown {
            return Err(AddressFormatError::UnsupportedScriptType(ScriptType::Unknown));
        }
        Ok(Self { address: decoded.string, payload: decoded.locking_script_payload, script_type: decoded.script_type })
    }
}

#[derive(Debug, Clone)]
pub enum KeyMaterial {
    Extended(ExtendedKey),
    WatchAddress(WatchAddressPublicKey),
}

impl KeyMaterial {
    pub fn scope(&self) -> KeyScope {
        match self {
            KeyMaterial::Extended(_) => KeyScope::ExtendedKey,
            KeyMaterial::WatchAddress(_) => KeyScope::WatchOnly,
        }
    }

    pub fn is_watch_only(&self) -> bool {
        match self {
            KeyMaterial::Extended(key) => !key.is_private(),
            KeyMaterial::WatchAddress(_) => true,
        }
    }

    /// Printable form without private material.
    pub fn public_description(&self) -> String {
        match self {
            KeyMaterial::Extended(key) => key.neutered().to_string(),
            KeyMaterial::WatchAddress(watch) => watch.address.clone(),
        }
    }
}

/// First receive address for `key` under `purpose`, rendered by the network's converters.
pub fn first_address(key: &ExtendedKey, purpose: Purpose, network: NetworkType) -> KitResult<String> {
    let public_key = key.first_receive_key(purpose, network)?;
    let script_type = purpose.script_type();
    let payload = crate::address::script::payload_for_public_key(&public_key, script_type)?;
    let chain = AddressConverterChain::for_network(network.identity());
    Ok(chain.encode(&payload, script_type)?.string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn master(purpose: Purpose, network: NetworkType) -> ExtendedKey {
        ExtendedKey::from_mnemonic(MNEMONIC, "", purpose, network).unwrap()
    }

    #[test]
    fn bip_reference_first_addresses() {
        let cases = [
            (Purpose::Bip44, NetworkType::MainNet, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"),
            (Purpose::Bip49, NetworkType::TestNet, "2Mww8dCYPUpKHofjgcXcBCEGmniw9CoaiD2"),
            (Purpose::Bip84, NetworkType::MainNet, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"),
            (Purpose::Bip86, NetworkType::MainNet, "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"),
        ];
        for (purpose, network, expected) in cases {
            assert_eq!(first_address(&master(purpose, network), purpose, network).unwrap(), expected, "{purpose}");
        }
    }

    #[test]
    fn account_key_derives_receive_chain() {
        let zpub: ExtendedKey = "zpub6rFR7y4Q2AijBEqTUquhVz398htDFrtymD9xYYfG1m4wAcvPhXNfE3EfH1r1ADqtfSdVCToUG868RvUUkgDKf31mGDtKsAYz2oz2AGutZYs"
            .parse()
            .unwrap();
        assert_eq!(
            first_address(&zpub, Purpose::Bip84, NetworkType::MainNet).unwrap(),
            "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
        );
    }

    #[test]
    fn watch_key_rejects_unknown_script() {
        let decoded = DecodedAddress {
            string: "bc1z...".into(),
            locking_script_payload: vec![0; 2],
            script_type: ScriptType::Unknown,
            kind: crate::address::AddressKind::SegWit { version: 2 },
        };
        assert!(WatchAddressPublicKey::new(decoded).is_err());
    }

    #[test]
    fn scope_by_material() {
        let watch = KeyMaterial::WatchAddress(WatchAddressPublicKey {
            address: "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa".into(),
            payload: vec![0; 20],
            script_type: ScriptType::P2pkh,
        });
        assert_eq!(watch.scope(), KeyScope::WatchOnly);
        assert!(watch.is_watch_only());

        let key = KeyMaterial::Extended(master(Purpose::Bip84, NetworkType::MainNet));
        assert_eq!(key.scope(), KeyScope::ExtendedKey);
        assert!(!key.is_watch_only());
        assert!(key.public_description().starts_with("zpub"));
    }
}
