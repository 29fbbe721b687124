//! Native segwit addresses (BIP173 bech32 / BIP350 bech32m).

use bitcoin::bech32::{segwit, Hrp};

use super::{AddressConverter, AddressKind, DecodedAddress, ScriptType};
use crate::errors::AddressFormatError;
use crate::network::NetworkIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegWitBech32AddressConverter {
    prefix: String,
}

impl SegWitBech32AddressConverter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into().to_ascii_lowercase() }
    }

    pub fn for_network(network: &NetworkIdentity) -> Self {
        Self::new(network.bech32_prefix)
    }

    pub fn prefix(&self) -> &str { &self.prefix }
}

impl AddressConverter for SegWitBech32AddressConverter {
    fn name(&self) -> &'static str { "bech32" }

    fn convert(&self, address: &str) -> Result<DecodedAddress, AddressFormatError> {
        let (hrp, version, program) =
            segwit::decode(address).map_err(|e| AddressFormatError::Bech32(e.to_string()))?;

        let actual = hrp.to_lowercase();
        if actual != self.prefix {
            return Err(AddressFormatError::WrongPrefix { expected: self.prefix.clone(), actual });
        }

        let version = version.to_u8();
        let script_type = match (version, program.len()) {
            (0, 20) => ScriptType::P2wpkh,
            (0, 32) => ScriptType::P2wsh,
            (1, 32) => ScriptType::P2tr,
            _ => ScriptType::Unknown,
        };

        Ok(DecodedAddress {
            string: address.to_string(),
            locking_script_payload: program,
            script_type,
            kind: AddressKind::SegWit { version },
        })
    }

    fn encode(&self, payload: &[u8], script_type: ScriptType) -> Result<DecodedAddress, AddressFormatError> {
        let (fe, version) = match script_type {
            ScriptType::P2wpkh | ScriptType::P2wsh => (segwit::VERSION_0, 0),
            ScriptType::P2tr => (segwit::VERSION_1, 1),
            other => return Err(AddressFormatError::UnsupportedScriptType(other)),
        };
        let hrp = Hrp::parse(&self.prefix).map_err(|e| AddressFormatError::Bech32(e.to_string()))?;
        let string = segwit::encode(hrp, fe, payload).map_err(|e| AddressFormatError::Bech32(e.to_string()))?;

        Ok(DecodedAddress {
            string,
            locking_script_payload: payload.to_vec(),
            script_type,
            kind: AddressKind::SegWit { version },
        })
    }
}
