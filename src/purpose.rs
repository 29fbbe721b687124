//! Purpose resolver - derivation scheme → key version and restore converters.

use serde::{Deserialize, Serialize};

use crate::address::ScriptType;
use crate::keys::ExtendedKeyVersion;
use crate::network::NetworkType;

/// Key-derivation purpose (BIP43 level 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Bip44,
    Bip49,
    Bip84,
    Bip86,
}

/// Where the key material came from. Only watch-only sessions narrow the bip44 restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    Seed,
    ExtendedKey,
    WatchOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurposeResolution {
    pub extended_key_version: ExtendedKeyVersion,
    /// Restore converters to register, in registration order.
    pub restore_keys: Vec<Purpose>,
    /// Hodler CSV addresses are restored too.
    pub hodler: bool,
}

impl Purpose {
    pub const ALL: [Purpose; 4] = [Purpose::Bip44, Purpose::Bip49, Purpose::Bip84, Purpose::Bip86];

    pub fn number(&self) -> u32 {
        match self {
            Purpose::Bip44 => 44,
            Purpose::Bip49 => 49,
            Purpose::Bip84 => 84,
            Purpose::Bip86 => 86,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Bip44 => "bip44",
            Purpose::Bip49 => "bip49",
            Purpose::Bip84 => "bip84",
            Purpose::Bip86 => "bip86",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().trim_start_matches("bip") {
            "44" => Some(Purpose::Bip44),
            "49" => Some(Purpose::Bip49),
            "84" => Some(Purpose::Bip84),
            "86" => Some(Purpose::Bip86),
            _ => None,
        }
    }

    /// Script type of addresses derived under this purpose.
    pub fn script_type(&self) -> ScriptType {
        match self {
            Purpose::Bip44 => ScriptType::P2pkh,
            Purpose::Bip49 => ScriptType::P2wpkhSh,
            Purpose::Bip84 => ScriptType::P2wpkh,
            Purpose::Bip86 => ScriptType::P2tr,
        }
    }

    pub fn private_version(&self, network: NetworkType) -> ExtendedKeyVersion {
        use ExtendedKeyVersion::*;
        match (self, network.is_main()) {
            (Purpose::Bip44 | Purpose::Bip86, true) => Xprv,
            (Purpose::Bip44 | Purpose::Bip86, false) => Tprv,
            (Purpose::Bip49, true) => Yprv,
            (Purpose::Bip49, false) => Uprv,
            (Purpose::Bip84, true) => Zprv,
            (Purpose::Bip84, false) => Vprv,
        }
    }

    pub fn public_version(&self, network: NetworkType) -> ExtendedKeyVersion {
        self.private_version(network).public()
    }

    pub fn resolve(&self, network: NetworkType, scope: KeyScope) -> PurposeResolution {
        let restore_keys = match self {
            Purpose::Bip44 if scope != KeyScope::WatchOnly => vec![Purpose::Bip44, Purpose::Bip49, Purpose::Bip84],
            other => vec![*other],
        };
        PurposeResolution {
            extended_key_version: self.private_version(network),
            restore_keys,
            hodler: *self == Purpose::Bip44,
        }
    }
}

impl std::fmt::Display for Purpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bip44_restores_broadly_unless_watch_only() {
        let r = Purpose::Bip44.resolve(NetworkType::MainNet, KeyScope::Seed);
        assert_eq!(r.restore_keys, vec![Purpose::Bip44, Purpose::Bip49, Purpose::Bip84]);
        assert_eq!(r.extended_key_version, ExtendedKeyVersion::Xprv);
        assert!(r.hodler);

        let r = Purpose::Bip44.resolve(NetworkType::MainNet, KeyScope::ExtendedKey);
        assert_eq!(r.restore_keys.len(), 3);

        let r = Purpose::Bip44.resolve(NetworkType::MainNet, KeyScope::WatchOnly);
        assert_eq!(r.restore_keys, vec![Purpose::Bip44]);
    }

    #[test]
    fn other_purposes_restore_themselves() {
        for purpose in [Purpose::Bip49, Purpose::Bip84, Purpose::Bip86] {
            for scope in [KeyScope::Seed, KeyScope::ExtendedKey, KeyScope::WatchOnly] {
                let r = purpose.resolve(NetworkType::MainNet, scope);
                assert_eq!(r.restore_keys, vec![purpose]);
                assert!(!r.hodler);
            }
        }
    }

    #[test]
    fn versions_follow_slip132() {
        assert_eq!(Purpose::Bip49.private_version(NetworkType::MainNet), ExtendedKeyVersion::Yprv);
        assert_eq!(Purpose::Bip84.private_version(NetworkType::MainNet), ExtendedKeyVersion::Zprv);
        assert_eq!(Purpose::Bip86.private_version(NetworkType::MainNet), ExtendedKeyVersion::Xprv);
        assert_eq!(Purpose::Bip49.private_version(NetworkType::TestNet), ExtendedKeyVersion::Uprv);
        assert_eq!(Purpose::Bip84.private_version(NetworkType::RegTest), ExtendedKeyVersion::Vprv);
        assert_eq!(Purpose::Bip84.public_version(NetworkType::MainNet), ExtendedKeyVersion::Zpub);
    }

    #[test]
    fn parses_names() {
        assert_eq!(Purpose::from_str("BIP84"), Some(Purpose::Bip84));
        assert_eq!(Purpose::from_str("49"), Some(Purpose::Bip49));
        assert_eq!(Purpose::from_str("bip32"), None);
    }
}
