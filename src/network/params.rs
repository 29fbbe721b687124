//! Per-chain constant records.

use super::NetworkIdentity;

// https://github.com/bitcoin/bitcoin/blob/master/src/policy/policy.h (DUST_RELAY_TX_FEE)
const DUST_RELAY_TX_FEE: u64 = 3000;

pub static MAIN_NET: NetworkIdentity = NetworkIdentity {
    name: "Bitcoin",
    pub_key_hash: 0x00,
    private_key: 0x80,
    script_hash: 0x05,
    bech32_prefix: "bc",
    extended_public_version: 0x0488B21E,
    extended_private_version: 0x0488ADE4,
    magic: 0xF9BEB4D9,
    default_port: 8333,
    coin_type: 0,
    dns_seeds: &[
        "x5.seed.bitcoin.sipa.be",      // Pieter Wuille
        "x5.dnsseed.bluematt.me",       // Matt Corallo
        "x5.seed.bitcoinstats.com",     // Chris Decker
        "x5.seed.btc.petertodd.org",    // Peter Todd
        "x5.seed.bitcoin.sprovoost.nl", // Sjors Provoost
        "x5.seed.bitnodes.io",          // Addy Yeow
        "x5.dnsseed.emzy.de",           // Stephan Oeste
        "x5.seed.bitcoin.wiz.biz",      // Jason Maurice
    ],
    dust_relay_fee: DUST_RELAY_TX_FEE,
    api_sync_eligible: true,
    remote_chain_id: "bitcoin",
};

pub static TEST_NET: NetworkIdentity = NetworkIdentity {
    name: "Bitcoin",
    pub_key_hash: 0x6F,
    private_key: 0xEF,
    script_hash: 0xC4,
    bech32_prefix: "tb",
    extended_public_version: 0x043587CF,
    extended_private_version: 0x04358394,
    magic: 0x0B110907,
    default_port: 18333,
    coin_type: 1,
    dns_seeds: &[
        "testnet-seed.bitcoin.petertodd.org",
        "testnet-seed.bitcoin.jonasschnelli.ch",
        "testnet-seed.bluematt.me",
        "testnet-seed.bitcoin.schildbach.de",
        "bitcoin-testnet.bloqseeds.net",
    ],
    dust_relay_fee: DUST_RELAY_TX_FEE,
    api_sync_eligible: true,
    remote_chain_id: "bitcoin/testnet",
};

pub static REG_TEST: NetworkIdentity = NetworkIdentity {
    name: "BitcoinKit",
    pub_key_hash: 0x6F,
    private_key: 0xEF,
    script_hash: 0xC4,
    bech32_prefix: "bcrt",
    extended_public_version: 0x043587CF,
    extended_private_version: 0x04358394,
    magic: 0xFABFB5DA,
    default_port: 18444,
    coin_type: 1,
    dns_seeds: &[
        "btc-regtest.horizontalsystems.xyz",
        "btc01-regtest.horizontalsystems.xyz",
        "btc02-regtest.horizontalsystems.xyz",
        "btc03-regtest.horizontalsystems.xyz",
    ],
    dust_relay_fee: DUST_RELAY_TX_FEE,
    api_sync_eligible: false,
    remote_chain_id: "",
};
