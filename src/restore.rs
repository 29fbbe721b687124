//! Restore-key converters: the addresses a public key may have received funds on,
//! queried from the remote API during the initial restore.

use std::sync::Arc;

use bitcoin::secp256k1::PublicKey;

use crate::address::{script, AddressConverter, Base58AddressConverter, SegWitBech32AddressConverter};
use crate::errors::AddressFormatError;
use crate::network::NetworkIdentity;
use crate::plugins::HodlerPlugin;
use crate::purpose::Purpose;

#[derive(Debug, Clone)]
pub enum RestoreKeyConverter {
    Bip44(Arc<dyn AddressConverter>),
    Bip49(Arc<dyn AddressConverter>),
    Bip84(Arc<dyn AddressConverter>),
    Bip86(Arc<dyn AddressConverter>),
    Hodler(HodlerPlugin),
}

impl RestoreKeyConverter {
    /// Converter for `purpose`: base58 for bip44/49, bech32 for bip84/86.
    pub fn for_purpose(purpose: Purpose, network: &NetworkIdentity) -> Self {
        let base58 = || -> Arc<dyn AddressConverter> { Arc::new(Base58AddressConverter::for_network(network)) };
        let bech32 = || -> Arc<dyn AddressConverter> { Arc::new(SegWitBech32AddressConverter::for_network(network)) };
        match purpose {
            Purpose::Bip44 => RestoreKeyConverter::Bip44(base58()),
            Purpose::Bip49 => RestoreKeyConverter::Bip49(base58()),
            Purpose::Bip84 => RestoreKeyConverter::Bip84(bech32()),
            Purpose::Bip86 => RestoreKeyConverter::Bip86(bech32()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RestoreKeyConverter::Bip44(_) => "bip44",
            RestoreKeyConverter::Bip49(_) => "bip49",
            RestoreKeyConverter::Bip84(_) => "bip84",
            RestoreKeyConverter::Bip86(_) => "bip86",
            RestoreKeyConverter::Hodler(_) => HodlerPlugin::NAME,
        }
    }

    pub fn purpose(&self) -> Option<Purpose> {
        match self {
            RestoreKeyConverter::Bip44(_) => Some(Purpose::Bip44),
            RestoreKeyConverter::Bip49(_) => Some(Purpose::Bip49),
            RestoreKeyConverter::Bip84(_) => Some(Purpose::Bip84),
            RestoreKeyConverter::Bip86(_) => Some(Purpose::Bip86),
            RestoreKeyConverter::Hodler(_) => None,
        }
    }

    pub fn keys_for_api_restore(&self, public_key: &PublicKey) -> Result<Vec<String>, AddressFormatError> {
        let (converter, purpose) = match self {
            RestoreKeyConverter::Hodler(plugin) => return plugin.restore_addresses(public_key),
            RestoreKeyConverter::Bip44(c) => (c, Purpose::Bip44),
            RestoreKeyConverter::Bip49(c) => (c, Purpose::Bip49),
            RestoreKeyConverter::Bip84(c) => (c, Purpose::Bip84),
            RestoreKeyConverter::Bip86(c) => (c, Purpose::Bip86),
        };
        let script_type = purpose.script_type();
        let payload = script::payload_for_public_key(public_key, script_type)?;
        Ok(vec![converter.encode(&payload, script_type)?.string])
    }
}
