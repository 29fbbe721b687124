//! Kit configuration - passed from higher layers.

use std::path::PathBuf;

use crate::network::NetworkType;
use crate::purpose::Purpose;
use crate::sync::SyncMode;

pub const DEFAULT_CONFIRMATIONS_THRESHOLD: u32 = 6;
pub const PEER_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct KitConfig {
    pub wallet_id: String,
    pub purpose: Purpose,
    pub network: NetworkType,
    pub sync_mode: SyncMode,
    pub confirmations_threshold: u32,
    /// Overrides `storage::paths::data_dir()`.
    pub data_dir: Option<PathBuf>,
}

impl KitConfig {
    pub fn new(wallet_id: impl Into<String>, purpose: Purpose) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            purpose,
            network: NetworkType::default(),
            sync_mode: SyncMode::default(),
            confirmations_threshold: DEFAULT_CONFIRMATIONS_THRESHOLD,
            data_dir: None,
        }
    }
    pub fn with_network(mut self, network: NetworkType) -> Self { self.network = network; self }
    pub fn with_sync_mode(mut self, mode: SyncMode) -> Self { self.sync_mode = mode; self }
    pub fn with_confirmations(mut self, threshold: u32) -> Self { self.confirmations_threshold = threshold; self }
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self { self.data_dir = Some(path.into()); self }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::storage::paths::data_dir)
    }
}
