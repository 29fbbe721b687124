//! Legacy base58check addresses (P2PKH / P2SH).

use bitcoin::base58;

use super::{AddressConverter, AddressKind, DecodedAddress, ScriptType};
use crate::errors::AddressFormatError;
use crate::network::NetworkIdentity;

const HASH_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base58AddressConverter {
    address_version: u8,
    address_script_version: u8,
}

impl Base58AddressConverter {
    pub fn new(address_version: u8, address_script_version: u8) -> Self {
        Self { address_version, address_script_version }
    }

    pub fn for_network(network: &NetworkIdentity) -> Self {
        Self::new(network.pub_key_hash, network.script_hash)
    }
}

impl AddressConverter for Base58AddressConverter {
    fn name(&self) -> &'static str { "base58" }

    fn convert(&self, address: &str) -> Result<DecodedAddress, AddressFormatError> {
        let data = base58::decode_check(address).map_err(|e| AddressFormatError::Base58(e.to_string()))?;
        if data.len() != HASH_LEN + 1 {
            return Err(AddressFormatError::WrongPayloadLength(data.len().saturating_sub(1)));
        }

        let script_type = match data[0] {
            v if v == self.address_version => ScriptType::P2pkh,
            v if v == self.address_script_version => ScriptType::P2sh,
            v => return Err(AddressFormatError::WrongVersionByte(v)),
        };

        Ok(DecodedAddress {
            string: address.to_string(),
            locking_script_payload: data[1..].to_vec(),
            script_type,
            kind: AddressKind::Base58,
        })
    }

    fn encode(&self, payload: &[u8], script_type: ScriptType) -> Result<DecodedAddress, AddressFormatError> {
        let version = match script_type {
            ScriptType::P2pkh => self.address_version,
            ScriptType::P2sh | ScriptType::P2wpkhSh => self.address_script_version,
            other => return Err(AddressFormatError::UnsupportedScriptType(other)),
        };
        if payload.len() != HASH_LEN {
            return Err(AddressFormatError::WrongPayloadLength(payload.len()));
        }

        let mut data = Vec::with_capacity(HASH_LEN + 1);
        data.push(version);
        data.extend_from_slice(payload);

        Ok(DecodedAddress {
            string: base58::encode_check(&data),
            locking_script_payload: payload.to_vec(),
            script_type,
            kind: AddressKind::Base58,
        })
    }
}
