//! Sync mode and API sync-state bookkeeping.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::KitResult;
use crate::network::NetworkIdentity;
use crate::storage::Storage;

/// How historical data is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// Fast: restore from a remote API, headers from a recent checkpoint.
    #[default]
    Api,
    /// Headers from genesis, no remote restore.
    Full,
    /// Fast, with Blockchair as transaction source.
    Blockchair,
}

impl SyncMode {
    pub const ALL: [SyncMode; 3] = [SyncMode::Api, SyncMode::Full, SyncMode::Blockchair];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Api => "api",
            SyncMode::Full => "full",
            SyncMode::Blockchair => "blockchair",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "api" => Some(SyncMode::Api),
            "full" => Some(SyncMode::Full),
            "blockchair" | "blockchair-assisted" => Some(SyncMode::Blockchair),
            _ => None,
        }
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const API_SYNCED_KEY: &str = "api_sync_state/restored";

/// Tracks whether the one-off API restore already ran for this wallet.
#[derive(Clone)]
pub struct ApiSyncStateManager {
    storage: Arc<dyn Storage>,
    restore_from_api: bool,
}

impl ApiSyncStateManager {
    pub fn new(storage: Arc<dyn Storage>, restore_from_api: bool) -> Self {
        Self { storage, restore_from_api }
    }

    pub fn for_session(storage: Arc<dyn Storage>, network: &NetworkIdentity, sync_mode: SyncMode) -> Self {
        Self::new(storage, network.api_sync_eligible && sync_mode != SyncMode::Full)
    }

    pub fn restore_from_api(&self) -> bool { self.restore_from_api }

    pub fn restored(&self) -> bool {
        self.storage.value(API_SYNCED_KEY).as_deref() == Some("true")
    }

    pub fn set_restored(&self, restored: bool) -> KitResult<()> {
        self.storage.set_value(API_SYNCED_KEY, if restored { "true" } else { "false" })
    }
}

impl std::fmt::Debug for ApiSyncStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSyncStateManager").field("restore_from_api", &self.restore_from_api).finish()
    }
}
