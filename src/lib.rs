//! Bitcoin Kit: composes a wallet runtime from network, purpose, and sync mode.
//!
//! # Architecture
//!
//! ```text
//! Kit (composition root)
//!   │
//!   ├── NetworkIdentity   (network type → static chain constants)
//!   ├── Purpose           (bip44/49/84/86 → key version, restore converters)
//!   ├── AddressConverterChain [bech32, base58]
//!   ├── Checkpoint        (genesis for full sync, latest embedded/persisted otherwise)
//!   ├── RemoteSource      (blockchain.com / Blockchair / BCoin / none)
//!   ├── BlockValidatorSet (proof of work + difficulty chain)
//!   │
//!   └── SyncEngineBuilder::build(EngineConfig) → engine
//!         └── restore-key converters registered after build
//! ```
//!
//! # Entry points
//!
//! | Constructor | Key material |
//! |-------------|--------------|
//! | `Kit::from_seed` | BIP32 seed bytes |
//! | `Kit::from_mnemonic` | BIP39 words |
//! | `Kit::from_extended_key` | xprv/xpub (and SLIP-132 variants) |
//! | `Kit::from_watch_address` | address string, no private keys |
//!
//! # Features
//!
//! - `native` - HTTP remote sources, data directory, tracing (default)
//! - `wallet` - BDK-backed sync engine
//!
//! # Usage
//!
//! ```ignore
//! use bitcoin_kit::{Kit, KitConfig, NetworkType, Purpose, SyncMode, BlueprintBuilder};
//!
//! let kit = Kit::from_mnemonic(
//!     "abandon abandon ... about",
//!     "",
//!     KitConfig::new("wallet-1", Purpose::Bip84).with_network(NetworkType::MainNet),
//!     BlueprintBuilder,
//! )?;
//! println!("{}", kit.storage_name());
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod address;
pub mod block;
pub mod checkpoint;
pub mod errors;
pub mod keys;
pub mod network;
pub mod payment;
pub mod plugins;
pub mod purpose;
pub mod restore;
pub mod storage;
pub mod sync;
pub mod validation;

// =============================================================================
// Native-only modules (HTTP clients, filesystem layout, tracing)
// =============================================================================
#[cfg(feature = "native")]
pub mod kit;
#[cfg(feature = "native")]
pub mod logging;
#[cfg(feature = "native")]
pub mod remote;
#[cfg(feature = "wallet")]
pub mod wallet;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use address::{AddressConverter, AddressConverterChain, Base58AddressConverter, DecodedAddress, ScriptType, SegWitBech32AddressConverter};
pub use block::{Block, BlockHeader};
pub use checkpoint::Checkpoint;
pub use errors::{AddressFormatError, KitError, KitResult};
pub use keys::{ExtendedKey, ExtendedKeyVersion, KeyMaterial, WatchAddressPublicKey};
pub use network::{NetworkIdentity, NetworkType};
pub use payment::{BitcoinPaymentData, PaymentAddressParser};
pub use purpose::Purpose;
pub use restore::RestoreKeyConverter;
pub use storage::{JsonFileStorage, Storage};
pub use sync::{ApiSyncStateManager, SyncMode};
pub use validation::{BlockValidator, BlockValidatorError, BlockValidatorSet};

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use kit::{Blueprint, BlueprintBuilder, EngineConfig, Kit, KitConfig, SyncEngine, SyncEngineBuilder};
#[cfg(feature = "native")]
pub use remote::{ApiTransactionProvider, BlockHashFetcher, RemoteSourceKind};
#[cfg(feature = "wallet")]
pub use wallet::{BdkEngine, BdkEngineBuilder};
