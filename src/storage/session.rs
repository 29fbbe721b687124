use crate::errors::{KitError, KitResult};
use crate::network::NetworkType;
use crate::purpose::Purpose;
use crate::sync::SyncMode;

/// Identifies one wallet session's storage. Distinct keys never share a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WalletSessionKey {
    pub wallet_id: String,
    pub network: NetworkType,
    pub purpose: Purpose,
    pub sync_mode: SyncMode,
}

impl WalletSessionKey {
    pub fn new(wallet_id: impl Into<String>, network: NetworkType, purpose: Purpose, sync_mode: SyncMode) -> KitResult<Self> {
        let wallet_id = wallet_id.into();
        validate_wallet_id(&wallet_id)?;
        Ok(Self { wallet_id, network, purpose, sync_mode })
    }

    /// `{walletId}-{network}-{purpose}-{syncMode}`
    pub fn name(&self) -> String {
        format!("{}-{}-{}-{}", self.wallet_id, self.network.as_str(), self.purpose.as_str(), self.sync_mode.as_str())
    }

    pub fn file_name(&self) -> String {
        format!("{}.json", self.name())
    }
}

pub(crate) fn validate_wallet_id(wallet_id: &str) -> KitResult<()> {
    if wallet_id.is_empty() {
        return Err(KitError::UnsupportedConfiguration("wallet id is empty".into()));
    }
    if wallet_id.contains(['/', '\\']) || wallet_id == "." || wallet_id == ".." {
        return Err(KitError::UnsupportedConfiguration(format!("wallet id {:?} is not a file name", wallet_id)));
    }
    Ok(())
}
