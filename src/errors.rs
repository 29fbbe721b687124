//! Error types surfaced by composition.

/// Result alias used across the crate.
pub type KitResult<T> = Result<T, KitError>;

/// Composition failures. Nothing is retried and nothing is half-built.
#[derive(Debug, thiserror::Error)]
pub enum KitError {
    #[error("Address format: {0}")]
    AddressFormat(#[from] AddressFormatError),
    #[error("Key derivation: {0}")]
    KeyDerivation(String),
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
    #[error("Storage: {0}")]
    Storage(String),
    #[error("Remote source: {0}")]
    Remote(String),
}

impl From<bitcoin::bip32::Error> for KitError {
    fn from(e: bitcoin::bip32::Error) -> Self {
        KitError::KeyDerivation(e.to_string())
    }
}

impl From<std::io::Error> for KitError {
    fn from(e: std::io::Error) -> Self {
        KitError::Storage(e.to_string())
    }
}

/// Address decode/encode failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressFormatError {
    #[error("base58: {0}")]
    Base58(String),
    #[error("bech32: {0}")]
    Bech32(String),
    #[error("wrong version byte {0:#04x}")]
    WrongVersionByte(u8),
    #[error("wrong payload length {0}")]
    WrongPayloadLength(usize),
    #[error("wrong prefix: expected {expected}, got {actual}")]
    WrongPrefix { expected: String, actual: String },
    #[error("unsupported script type {0:?}")]
    UnsupportedScriptType(crate::address::ScriptType),
    #[error("no converter accepted input: [{}]", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Unrecognized(Vec<AddressFormatError>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_lists_every_reason() {
        let err = AddressFormatError::Unrecognized(vec![
            AddressFormatError::Bech32("invalid checksum".into()),
            AddressFormatError::WrongVersionByte(0x30),
        ]);
        let text = err.to_string();
        assert!(text.contains("invalid checksum"));
        assert!(text.contains("0x30"));
    }

    #[test]
    fn kit_error_wraps_address_errors() {
        let err: KitError = AddressFormatError::WrongPayloadLength(3).into();
        assert!(matches!(err, KitError::AddressFormat(_)));
    }
}
