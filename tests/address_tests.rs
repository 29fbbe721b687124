//! Address Tests - converter chain, first addresses, payment URIs
//!
//! These tests verify:
//! 1. The network chain decodes every standard address type
//! 2. First addresses match the BIP44/49/84/86 reference vectors
//! 3. BIP21 URIs resolve to a decodable address

use bitcoin_kit::{
    AddressConverterChain, AddressFormatError, Blueprint, Kit, NetworkType, PaymentAddressParser, Purpose,
    ScriptType,
};

const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn main_chain() -> AddressConverterChain {
    AddressConverterChain::for_network(NetworkType::MainNet.identity())
}

/// Test: one chain handles base58 and bech32/bech32m inputs
#[test]
fn chain_decodes_standard_types() {
    let chain = main_chain();
    let cases = [
        ("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", ScriptType::P2pkh, 20),
        ("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", ScriptType::P2sh, 20),
        ("bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu", ScriptType::P2wpkh, 20),
        ("bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3", ScriptType::P2wsh, 32),
        ("bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr", ScriptType::P2tr, 32),
    ];
    for (address, script_type, len) in cases {
        let decoded = chain.convert(address).expect(address);
        assert_eq!(decoded.script_type, script_type, "{}", address);
        assert_eq!(decoded.locking_script_payload.len(), len, "{}", address);
        assert_eq!(decoded.string, address);
    }
}

/// Test: failures carry the reason of every converter
#[test]
fn chain_reports_all_failures() {
    let err = main_chain().convert("not-an-address").unwrap_err();
    match err {
        AddressFormatError::Unrecognized(reasons) => assert_eq!(reasons.len(), 2),
        other => panic!("unexpected error {:?}", other),
    }
}

/// Test: main net chain rejects test net addresses
#[test]
fn chain_is_network_bound() {
    assert!(main_chain().convert("tb1q6rz28mcfaxtmd6v789l9rrlrusdprr9pqcpvkl").is_err());
    assert!(main_chain().convert("mkpZhYtJu2r87Js3pDiWJDmPte2NRZ8bJV").is_err());

    let test = AddressConverterChain::for_network(NetworkType::TestNet.identity());
    assert!(test.convert("tb1q6rz28mcfaxtmd6v789l9rrlrusdprr9pqcpvkl").is_ok());
    assert!(test.convert("mkpZhYtJu2r87Js3pDiWJDmPte2NRZ8bJV").is_ok());
}

/// Test: first addresses match BIP reference vectors
#[test]
fn first_addresses_match_reference_vectors() {
    let cases = [
        (Purpose::Bip44, NetworkType::MainNet, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"),
        (Purpose::Bip49, NetworkType::MainNet, "37VucYSaXLCAsxYyAPfbSi9eh4iEcbShgf"),
        (Purpose::Bip84, NetworkType::MainNet, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"),
        (Purpose::Bip86, NetworkType::MainNet, "bc1p5cyxnuxmeuwuvkwfem96lqzszd02n6xdcjrs20cac6yqjjwudpxqkedrcr"),
        (Purpose::Bip84, NetworkType::TestNet, "tb1q6rz28mcfaxtmd6v789l9rrlrusdprr9pqcpvkl"),
        (Purpose::Bip44, NetworkType::TestNet, "mkpZhYtJu2r87Js3pDiWJDmPte2NRZ8bJV"),
    ];
    for (purpose, network, expected) in cases {
        let address = Kit::<Blueprint>::first_address_from_mnemonic(TEST_MNEMONIC, "", purpose, network).expect("address");
        assert_eq!(address, expected, "{} on {}", purpose, network);
    }
}

/// Test: account-level zpub gives the same first address as the master key
#[test]
fn account_key_first_address() {
    let zpub = "zpub6rFR7y4Q2AijBEqTUquhVz398htDFrtymD9xYYfG1m4wAcvPhXNfE3EfH1r1ADqtfSdVCToUG868RvUUkgDKf31mGDtKsAYz2oz2AGutZYs";
    let address = Kit::<Blueprint>::first_address_from_extended_key(zpub, Purpose::Bip84, NetworkType::MainNet)
        .expect("address");
    assert_eq!(address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
}

/// Test: BIP21 URI → address the chain accepts
#[test]
fn payment_uri_resolves_to_address() {
    let parser = PaymentAddressParser::default();
    let data = parser.parse("bitcoin:bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu?amount=0.0015&label=Coffee%20Shop&foo=bar");

    assert_eq!(data.address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");
    assert_eq!(data.amount_sat, Some(150_000));
    assert_eq!(data.label.as_deref(), Some("Coffee Shop"));
    assert_eq!(data.parameters.get("foo").map(String::as_str), Some("bar"));
    assert!(main_chain().convert(&data.address).is_ok());
}
