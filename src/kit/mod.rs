//! Kit - the composition root.
//!
//! Turns key material plus a [`KitConfig`] into one fully configured sync engine.
//! A failed composition leaves no new session file behind; nothing is half-built.

mod config;
mod engine;

pub use config::{KitConfig, DEFAULT_CONFIRMATIONS_THRESHOLD, PEER_SIZE};
pub use engine::{Blueprint, BlueprintBuilder, EngineConfig, SyncEngine, SyncEngineBuilder};

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info};

use crate::address::AddressConverterChain;
use crate::checkpoint::Checkpoint;
use crate::errors::KitResult;
use crate::keys::{self, ExtendedKey, KeyMaterial, WatchAddressPublicKey};
use crate::network::NetworkType;
use crate::payment::PaymentAddressParser;
use crate::plugins::{BlockMedianTimeHelper, HodlerPlugin, Plugin};
use crate::purpose::{KeyScope, Purpose};
use crate::remote;
use crate::restore::RestoreKeyConverter;
use crate::storage::{paths, Storage, WalletSessionKey};
use crate::sync::{ApiSyncStateManager, SyncMode};
use crate::validation;

/// A composed wallet session around engine `E`.
pub struct Kit<E: SyncEngine> {
    engine: E,
    network: NetworkType,
    purpose: Purpose,
    sync_mode: SyncMode,
    storage_name: String,
    storage_path: PathBuf,
}

impl<E: SyncEngine> Kit<E> {
    pub fn from_seed<B>(seed: &[u8], config: KitConfig, builder: B) -> KitResult<Self>
    where
        B: SyncEngineBuilder<Engine = E>,
    {
        let key = ExtendedKey::from_seed(seed, config.purpose, config.network)?;
        Self::compose(KeyMaterial::Extended(key), KeyScope::Seed, config, builder)
    }

    pub fn from_mnemonic<B>(words: &str, passphrase: &str, config: KitConfig, builder: B) -> KitResult<Self>
    where
        B: SyncEngineBuilder<Engine = E>,
    {
        let key = ExtendedKey::from_mnemonic(words, passphrase, config.purpose, config.network)?;
        Self::compose(KeyMaterial::Extended(key), KeyScope::Seed, config, builder)
    }

    /// Accepts xprv/xpub and their SLIP-132 variants; the version must match purpose and network.
    pub fn from_extended_key<B>(key: &str, config: KitConfig, builder: B) -> KitResult<Self>
    where
        B: SyncEngineBuilder<Engine = E>,
    {
        let key = ExtendedKey::from_str(key)?;
        key.validate_for(config.purpose, config.network)?;
        Self::compose(KeyMaterial::Extended(key), KeyScope::ExtendedKey, config, builder)
    }

    /// Watch-only session. The address is decoded before anything touches disk.
    pub fn from_watch_address<B>(address: &str, config: KitConfig, builder: B) -> KitResult<Self>
    where
        B: SyncEngineBuilder<Engine = E>,
    {
        let chain = AddressConverterChain::for_network(config.network.identity());
        let watch = WatchAddressPublicKey::new(chain.convert(address)?)?;
        debug!("Watching {} ({:?})", watch.address, watch.script_type);
        Self::compose(KeyMaterial::WatchAddress(watch), KeyScope::WatchOnly, config, builder)
    }

    fn compose<B>(key_material: KeyMaterial, scope: KeyScope, config: KitConfig, builder: B) -> KitResult<Self>
    where
        B: SyncEngineBuilder<Engine = E>,
    {
        let network = config.network.identity();
        let resolution = config.purpose.resolve(config.network, scope);
        let address_converter = AddressConverterChain::for_network(network);

        let remote_source = remote::select(config.network, config.sync_mode)?;
        let session = WalletSessionKey::new(&config.wallet_id, config.network, config.purpose, config.sync_mode)?;

        let dir = config.data_dir();
        let storage_path = paths::session_path(&dir, &session);
        let fresh = !storage_path.exists();
        let storage: Arc<dyn Storage> = Arc::new(paths::open_session(&dir, &session)?);

        let build = || -> KitResult<E> {
            let checkpoint = Checkpoint::resolve(config.network, config.sync_mode, storage.as_ref());
            if storage.checkpoint() != Some(checkpoint) {
                storage.save_checkpoint(&checkpoint)?;
            }

            let api_transaction_provider = match remote_source {
                Some(kind) => Some(remote::connect(kind, network, &checkpoint)?),
                None => None,
            };

            let median_time = BlockMedianTimeHelper::new(storage.clone(), config.sync_mode == SyncMode::Blockchair);
            let hodler = resolution.hodler.then(|| HodlerPlugin::new(address_converter.clone(), median_time));
            let plugins: Vec<Plugin> = hodler.iter().cloned().map(Plugin::Hodler).collect();

            info!(
                "Composing {} session {} (checkpoint {}, remote {})",
                config.network,
                session.name(),
                checkpoint.height(),
                remote_source.map_or("none", |kind| kind.as_str())
            );

            let engine_config = EngineConfig {
                network,
                network_type: config.network,
                remote_source,
                api_transaction_provider,
                checkpoint,
                api_sync_state: ApiSyncStateManager::for_session(storage.clone(), network, config.sync_mode),
                payment_address_parser: PaymentAddressParser::default(),
                wallet_id: config.wallet_id.clone(),
                confirmations_threshold: config.confirmations_threshold,
                peer_size: PEER_SIZE,
                sync_mode: config.sync_mode,
                storage: storage.clone(),
                storage_path: Some(storage_path.clone()),
                block_validator: validation::assemble(config.network, storage.clone()),
                plugins,
                purpose: config.purpose,
                key_material,
                address_converter,
            };
            debug!("Engine config: {:?}", engine_config);

            let mut engine = builder.build(engine_config)?;

            for purpose in &resolution.restore_keys {
                engine.add_restore_key_converter(RestoreKeyConverter::for_purpose(*purpose, network));
            }
            if let Some(hodler) = hodler {
                engine.add_restore_key_converter(RestoreKeyConverter::Hodler(hodler));
            }
            debug!("Registered restore converters for {:?} (hodler: {})", resolution.restore_keys, resolution.hodler);
            Ok(engine)
        };

        let engine = match build() {
            Ok(engine) => engine,
            Err(e) => {
                if fresh {
                    paths::discard_session(&storage_path);
                }
                return Err(e);
            }
        };

        Ok(Self {
            engine,
            network: config.network,
            purpose: config.purpose,
            sync_mode: config.sync_mode,
            storage_name: session.name(),
            storage_path,
        })
    }

    pub fn engine(&self) -> &E { &self.engine }
    pub fn engine_mut(&mut self) -> &mut E { &mut self.engine }
    pub fn into_engine(self) -> E { self.engine }

    pub fn network(&self) -> NetworkType { self.network }
    pub fn purpose(&self) -> Purpose { self.purpose }
    pub fn sync_mode(&self) -> SyncMode { self.sync_mode }

    /// `{walletId}-{network}-{purpose}-{syncMode}`
    pub fn storage_name(&self) -> &str { &self.storage_name }
    pub fn storage_path(&self) -> &Path { &self.storage_path }
}

impl Kit<Blueprint> {
    /// First receive address of a seed, without composing a session.
    pub fn first_address(seed: &[u8], purpose: Purpose, network: NetworkType) -> KitResult<String> {
        let key = ExtendedKey::from_seed(seed, purpose, network)?;
        keys::first_address(&key, purpose, network)
    }

    pub fn first_address_from_mnemonic(
        words: &str,
        passphrase: &str,
        purpose: Purpose,
        network: NetworkType,
    ) -> KitResult<String> {
        let key = ExtendedKey::from_mnemonic(words, passphrase, purpose, network)?;
        keys::first_address(&key, purpose, network)
    }

    /// Master (depth 0) or account (depth 3) keys only.
    pub fn first_address_from_extended_key(key: &str, purpose: Purpose, network: NetworkType) -> KitResult<String> {
        let key = ExtendedKey::from_str(key)?;
        key.validate_for(purpose, network)?;
        keys::first_address(&key, purpose, network)
    }

    /// Remove persisted sessions of every wallet not in `except`. Returns the number removed.
    pub fn clear(except: &[String]) -> KitResult<usize> {
        Self::clear_in(&paths::data_dir(), except)
    }

    pub fn clear_in(dir: &Path, except: &[String]) -> KitResult<usize> {
        for id in except {
            crate::storage::validate_wallet_id(id)?;
        }
        let removed = paths::clear(dir, except)?;
        info!("Cleared {} stored sessions in {}", removed, dir.display());
        Ok(removed)
    }
}

impl<E: SyncEngine> std::fmt::Debug for Kit<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kit")
            .field("network", &self.network)
            .field("purpose", &self.purpose)
            .field("sync_mode", &self.sync_mode)
            .field("storage_name", &self.storage_name)
            .finish_non_exhaustive()
    }
}
