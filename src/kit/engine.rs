//! The seam to the sync engine: one `EngineConfig` in, one engine out.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::address::AddressConverterChain;
use crate::checkpoint::Checkpoint;
use crate::errors::KitResult;
use crate::keys::KeyMaterial;
use crate::network::{NetworkIdentity, NetworkType};
use crate::payment::PaymentAddressParser;
use crate::plugins::Plugin;
use crate::purpose::Purpose;
use crate::remote::{ApiTransactionProvider, RemoteSourceKind};
use crate::restore::RestoreKeyConverter;
use crate::storage::Storage;
use crate::sync::{ApiSyncStateManager, SyncMode};
use crate::validation::BlockValidatorSet;

/// Everything the engine needs, resolved and mutually consistent.
pub struct EngineConfig {
    pub network: &'static NetworkIdentity,
    pub network_type: NetworkType,
    pub remote_source: Option<RemoteSourceKind>,
    pub api_transaction_provider: Option<Arc<dyn ApiTransactionProvider>>,
    pub checkpoint: Checkpoint,
    pub api_sync_state: ApiSyncStateManager,
    pub payment_address_parser: PaymentAddressParser,
    pub wallet_id: String,
    pub confirmations_threshold: u32,
    pub peer_size: usize,
    pub sync_mode: SyncMode,
    pub storage: Arc<dyn Storage>,
    pub storage_path: Option<PathBuf>,
    pub block_validator: BlockValidatorSet,
    pub plugins: Vec<Plugin>,
    pub purpose: Purpose,
    pub key_material: KeyMaterial,
    pub address_converter: AddressConverterChain,
}

impl EngineConfig {
    /// Inspectable view without private key material.
    pub fn summary(&self) -> Value {
        json!({
            "network": self.network_type.as_str(),
            "chain": self.network.name,
            "purpose": self.purpose.as_str(),
            "sync_mode": self.sync_mode.as_str(),
            "wallet_id": self.wallet_id,
            "checkpoint": {
                "height": self.checkpoint.height(),
                "hash": self.checkpoint.block.header.hash.to_string(),
            },
            "remote_source": self.remote_source.map(|kind| kind.as_str()),
            "restore_from_api": self.api_sync_state.restore_from_api(),
            "confirmations_threshold": self.confirmations_threshold,
            "peer_size": self.peer_size,
            "validators": self.block_validator.names(),
            "plugins": self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "address_converters": self.address_converter.names(),
            "key": self.key_material.public_description(),
            "watch_only": self.key_material.is_watch_only(),
            "storage": self.storage_path.as_ref().map(|p| p.display().to_string()),
        })
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("network", &self.network_type)
            .field("purpose", &self.purpose)
            .field("sync_mode", &self.sync_mode)
            .field("wallet_id", &self.wallet_id)
            .field("checkpoint", &self.checkpoint.height())
            .field("remote_source", &self.remote_source)
            .field("validators", &self.block_validator)
            .finish_non_exhaustive()
    }
}

/// Built engine; restore converters are registered after construction.
pub trait SyncEngine {
    fn add_restore_key_converter(&mut self, converter: RestoreKeyConverter);
}

pub trait SyncEngineBuilder {
    type Engine: SyncEngine;

    /// Called exactly once per `Kit`.
    fn build(self, config: EngineConfig) -> KitResult<Self::Engine>;
}

/// Engine that keeps the composed configuration for inspection.
#[derive(Debug)]
pub struct Blueprint {
    config: EngineConfig,
    restore_key_converters: Vec<RestoreKeyConverter>,
}

impl Blueprint {
    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn restore_key_converters(&self) -> &[RestoreKeyConverter] { &self.restore_key_converters }

    pub fn summary(&self) -> Value {
        let mut summary = self.config.summary();
        summary["restore_key_converters"] =
            json!(self.restore_key_converters.iter().map(|c| c.name()).collect::<Vec<_>>());
        summary
    }
}

impl SyncEngine for Blueprint {
    fn add_restore_key_converter(&mut self, converter: RestoreKeyConverter) {
        self.restore_key_converters.push(converter);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BlueprintBuilder;

impl SyncEngineBuilder for BlueprintBuilder {
    type Engine = Blueprint;

    fn build(self, config: EngineConfig) -> KitResult<Blueprint> {
        Ok(Blueprint { config, restore_key_converters: Vec::new() })
    }
}
