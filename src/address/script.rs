//! Locking scripts and payload derivation from public keys.

use bitcoin::hashes::Hash;
use bitcoin::key::TapTweak;
use bitcoin::secp256k1::{PublicKey, Secp256k1};
use bitcoin::{CompressedPublicKey, PubkeyHash, ScriptBuf, ScriptHash, WitnessProgram, WitnessVersion};

use super::ScriptType;
use crate::errors::AddressFormatError;

/// Locking script for a 20-byte hash payload or a v0/v1 witness program.
pub fn locking_script(payload: &[u8], script_type: ScriptType) -> Option<ScriptBuf> {
    match script_type {
        ScriptType::P2pkh => PubkeyHash::from_slice(payload).ok().map(|hash| ScriptBuf::new_p2pkh(&hash)),
        ScriptType::P2sh | ScriptType::P2wpkhSh => {
            ScriptHash::from_slice(payload).ok().map(|hash| ScriptBuf::new_p2sh(&hash))
        }
        ScriptType::P2wpkh | ScriptType::P2wsh => witness_script(0, payload),
        ScriptType::P2tr => witness_script(1, payload),
        ScriptType::Unknown => None,
    }
}

/// `<version> <program>`, or None when the program is not valid for `version`.
pub fn witness_script(version: u8, program: &[u8]) -> Option<ScriptBuf> {
    let version = WitnessVersion::try_from(version).ok()?;
    let program = WitnessProgram::new(version, program).ok()?;
    Some(ScriptBuf::new_witness_program(&program))
}

/// Payload a converter needs to render the address of `public_key` as `script_type`.
pub fn payload_for_public_key(public_key: &PublicKey, script_type: ScriptType) -> Result<Vec<u8>, AddressFormatError> {
    let key = CompressedPublicKey(*public_key);
    match script_type {
        ScriptType::P2pkh => Ok(key.pubkey_hash().to_byte_array().to_vec()),
        ScriptType::P2wpkh => Ok(key.wpubkey_hash().to_byte_array().to_vec()),
        // BIP49: hash of the `OP_0 <key hash>` redeem script.
        ScriptType::P2wpkhSh => {
            let redeem_script = ScriptBuf::new_p2wpkh(&key.wpubkey_hash());
            Ok(redeem_script.script_hash().to_byte_array().to_vec())
        }
        ScriptType::P2tr => {
            let secp = Secp256k1::verification_only();
            let (internal, _) = public_key.x_only_public_key();
            let (tweaked, _) = internal.tap_tweak(&secp, None);
            Ok(tweaked.to_inner().serialize().to_vec())
        }
        other => Err(AddressFormatError::UnsupportedScriptType(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p2pkh_script_layout() {
        let script = locking_script(&[0xab; 20], ScriptType::P2pkh).unwrap();
        assert!(script.is_p2pkh());
        let bytes = script.as_bytes();
        assert_eq!(bytes.len(), 25);
        assert_eq!(&bytes[..3], &[0x76, 0xa9, 0x14]);
        assert_eq!(&bytes[23..], &[0x88, 0xac]);
    }

    #[test]
    fn nested_segwit_uses_p2sh() {
        assert!(locking_script(&[0x01; 20], ScriptType::P2wpkhSh).unwrap().is_p2sh());
    }

    #[test]
    fn taproot_script_uses_op_1() {
        let script = witness_script(1, &[0u8; 32]).unwrap();
        assert!(script.is_p2tr());
        assert_eq!(script.as_bytes()[0], 0x51);
        assert_eq!(script.as_bytes()[1], 32);
    }

    #[test]
    fn invalid_witness_programs_have_no_script() {
        assert!(witness_script(0, &[0u8; 25]).is_none());
        assert!(witness_script(17, &[0u8; 32]).is_none());
    }

    #[test]
    fn unknown_type_has_no_script() {
        assert!(locking_script(&[0u8; 20], ScriptType::Unknown).is_none());
        assert!(locking_script(&[0u8; 19], ScriptType::P2pkh).is_none());
    }
}
