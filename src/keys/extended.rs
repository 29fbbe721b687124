//! BIP32 extended keys with SLIP-132 version prefixes.
//!
//! `bitcoin::bip32` only understands xprv/xpub/tprv/tpub, so the version bytes
//! are swapped to the standard pair before decoding and back after encoding.

use std::str::FromStr;

use bitcoin::base58;
use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use zeroize::Zeroizing;

use crate::errors::{KitError, KitResult};
use crate::network::NetworkType;
use crate::purpose::Purpose;

pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtendedKeyVersion {
    Xprv,
    Xpub,
    Yprv,
    Ypub,
    Zprv,
    Zpub,
    Tprv,
    Tpub,
    Uprv,
    Upub,
    Vprv,
    Vpub,
}

impl ExtendedKeyVersion {
    pub const ALL: [ExtendedKeyVersion; 12] = [
        Self::Xprv, Self::Xpub, Self::Yprv, Self::Ypub, Self::Zprv, Self::Zpub,
        Self::Tprv, Self::Tpub, Self::Uprv, Self::Upub, Self::Vprv, Self::Vpub,
    ];

    pub fn value(&self) -> u32 {
        match self {
            Self::Xprv => 0x0488ADE4,
            Self::Xpub => 0x0488B21E,
            Self::Yprv => 0x049D7878,
            Self::Ypub => 0x049D7CB2,
            Self::Zprv => 0x04B2430C,
            Self::Zpub => 0x04B24746,
            Self::Tprv => 0x04358394,
            Self::Tpub => 0x043587CF,
            Self::Uprv => 0x044A4E28,
            Self::Upub => 0x044A5262,
            Self::Vprv => 0x045F18BC,
            Self::Vpub => 0x045F1CF6,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.value() == value)
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Self::Xprv | Self::Yprv | Self::Zprv | Self::Tprv | Self::Uprv | Self::Vprv)
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Self::Xprv | Self::Xpub | Self::Yprv | Self::Ypub | Self::Zprv | Self::Zpub)
    }

    /// Public counterpart (identity for public versions).
    pub fn public(&self) -> Self {
        match self {
            Self::Xprv => Self::Xpub,
            Self::Yprv => Self::Ypub,
            Self::Zprv => Self::Zpub,
            Self::Tprv => Self::Tpub,
            Self::Uprv => Self::Upub,
            Self::Vprv => Self::Vpub,
            public => *public,
        }
    }

    /// Purposes a key with this prefix may be used for.
    pub fn purposes(&self) -> &'static [Purpose] {
        match self {
            Self::Xprv | Self::Xpub | Self::Tprv | Self::Tpub => &[Purpose::Bip44, Purpose::Bip86],
            Self::Yprv | Self::Ypub | Self::Uprv | Self::Upub => &[Purpose::Bip49],
            Self::Zprv | Self::Zpub | Self::Vprv | Self::Vpub => &[Purpose::Bip84],
        }
    }

    /// Version `bitcoin::bip32` decodes: xprv/xpub on main, tprv/tpub elsewhere.
    fn standard(&self) -> u32 {
        match (self.is_main(), self.is_private()) {
            (true, true) => Self::Xprv.value(),
            (true, false) => Self::Xpub.value(),
            (false, true) => Self::Tprv.value(),
            (false, false) => Self::Tpub.value(),
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Xprv => "xprv",
            Self::Xpub => "xpub",
            Self::Yprv => "yprv",
            Self::Ypub => "ypub",
            Self::Zprv => "zprv",
            Self::Zpub => "zpub",
            Self::Tprv => "tprv",
            Self::Tpub => "tpub",
            Self::Uprv => "uprv",
            Self::Upub => "upub",
            Self::Vprv => "vprv",
            Self::Vpub => "vpub",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Key {
    Private(Xpriv),
    Public(Xpub),
}

/// BIP32 key plus the SLIP-132 version it is presented with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    key: Key,
    version: ExtendedKeyVersion,
}

impl ExtendedKey {
    /// Master private key from a BIP32 seed, tagged with the purpose's version.
    pub fn from_seed(seed: &[u8], purpose: Purpose, network: NetworkType) -> KitResult<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(KitError::KeyDerivation(format!(
                "seed must be {}-{} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }
        let master = Xpriv::new_master(network.kind(), seed)?;
        Ok(Self { key: Key::Private(master), version: purpose.private_version(network) })
    }

    /// BIP39 words → seed → master key.
    pub fn from_mnemonic(words: &str, passphrase: &str, purpose: Purpose, network: NetworkType) -> KitResult<Self> {
        let mnemonic = bip39::Mnemonic::parse_normalized(words)
            .map_err(|e| KitError::KeyDerivation(format!("Invalid mnemonic: {}", e)))?;
        let seed = Zeroizing::new(mnemonic.to_seed(passphrase));
        Self::from_seed(&seed[..], purpose, network)
    }

    pub fn version(&self) -> ExtendedKeyVersion { self.version }

    pub fn is_private(&self) -> bool { matches!(self.key, Key::Private(_)) }

    pub fn depth(&self) -> u8 {
        match &self.key {
            Key::Private(k) => k.depth,
            Key::Public(k) => k.depth,
        }
    }

    /// Reject keys whose prefix does not fit the purpose or the network.
    pub fn validate_for(&self, purpose: Purpose, network: NetworkType) -> KitResult<()> {
        if self.version.is_main() != network.is_main() {
            return Err(KitError::KeyDerivation(format!(
                "{} key cannot be used on {}",
                self.version.prefix(),
                network
            )));
        }
        if !self.version.purposes().contains(&purpose) {
            return Err(KitError::KeyDerivation(format!(
                "{} key cannot be used for {}",
                self.version.prefix(),
                purpose
            )));
        }
        Ok(())
    }

    pub fn xpriv(&self) -> Option<&Xpriv> {
        match &self.key {
            Key::Private(k) => Some(k),
            Key::Public(_) => None,
        }
    }

    /// xprv/xpub/tprv/tpub form, as descriptor parsers expect it.
    pub fn standard_encoding(&self) -> String {
        match &self.key {
            Key::Private(k) => k.to_string(),
            Key::Public(k) => k.to_string(),
        }
    }

    /// Same key with private material removed.
    pub fn neutered(&self) -> Self {
        match &self.key {
            Key::Private(k) => {
                let secp = Secp256k1::signing_only();
                Self { key: Key::Public(Xpub::from_priv(&secp, k)), version: self.version.public() }
            }
            Key::Public(_) => self.clone(),
        }
    }

    /// Public key of the first receive address.
    ///
    /// Master keys derive `m/purpose'/coin'/0'/0/0`; account keys (depth 3) derive `0/0`.
    pub fn first_receive_key(&self, purpose: Purpose, network: NetworkType) -> KitResult<PublicKey> {
        let path = match self.depth() {
            0 => format!("m/{}'/{}'/0'/0/0", purpose.number(), network.identity().coin_type),
            3 => "m/0/0".to_string(),
            depth => {
                return Err(KitError::KeyDerivation(format!(
                    "expected a master or account key, got depth {}",
                    depth
                )))
            }
        };
        let path = DerivationPath::from_str(&path)?;

        let secp = Secp256k1::new();
        match &self.key {
            Key::Private(k) => Ok(Xpub::from_priv(&secp, &k.derive_priv(&secp, &path)?).public_key),
            Key::Public(k) => Ok(k.derive_pub(&secp, &path)?.public_key),
        }
    }
}

impl FromStr for ExtendedKey {
    type Err = KitError;

    fn from_str(text: &str) -> KitResult<Self> {
        let mut data = base58::decode_check(text.trim())
            .map_err(|e| KitError::KeyDerivation(format!("extended key: {}", e)))?;
        if data.len() != 78 {
            return Err(KitError::KeyDerivation(format!("extended key must be 78 bytes, got {}", data.len())));
        }

        let raw = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let version = ExtendedKeyVersion::from_value(raw)
            .ok_or_else(|| KitError::KeyDerivation(format!("unknown extended key version {:#010x}", raw)))?;
        data[..4].copy_from_slice(&version.standard().to_be_bytes());

        let key = if version.is_private() {
            Key::Private(Xpriv::decode(&data)?)
        } else {
            Key::Public(Xpub::decode(&data)?)
        };
        Ok(Self { key, version })
    }
}

impl std::fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut data = match &self.key {
            Key::Private(k) => k.encode(),
            Key::Public(k) => k.encode(),
        };
        data[..4].copy_from_slice(&self.version.value().to_be_bytes());
        f.write_str(&base58::encode_check(&data))
    }
}
