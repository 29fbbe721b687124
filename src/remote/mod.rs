//! Remote data sources for fast (API) sync.
//!
//! | Network | Sync mode | Source |
//! |---------|-----------|--------|
//! | main | blockchair | Blockchair, hashes via blocksdecoded then Blockchair above the checkpoint |
//! | main | api / full | blockchain.com, hashes via blocksdecoded |
//! | test | any | BCoin |
//! | regtest | api / full | none |
//! | regtest | blockchair | unsupported |
//!
//! Selection and client construction do no I/O. Retries belong to the sync engine.

mod bcoin;
mod blockchain_com;
mod blockchair;
mod hash_fetcher;
mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::checkpoint::Checkpoint;
use crate::errors::{KitError, KitResult};
use crate::network::{NetworkIdentity, NetworkType};
use crate::sync::SyncMode;

pub use bcoin::{BCoinApi, BCOIN_TESTNET_URL};
pub use blockchain_com::{BlockchainComApi, BLOCKCHAIN_COM_URL};
pub use blockchair::{BlockchairApi, BLOCKCHAIR_URL};
pub use hash_fetcher::{BlockchairBlockHashFetcher, CompositeBlockHashFetcher, HsBlockHashFetcher, HS_HASHES_URL};
pub use types::{ApiError, ApiOutput, ApiTransactionItem};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of historical transactions for restore addresses.
#[async_trait]
pub trait ApiTransactionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Confirmed transactions touching `addresses`, limited to blocks above `stop_height`.
    async fn transactions(&self, addresses: &[String], stop_height: Option<u32>) -> Result<Vec<ApiTransactionItem>, ApiError>;
}

#[async_trait]
pub trait BlockHashFetcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Hashes for the heights the source knows; unknown heights are absent.
    async fn fetch(&self, heights: &[u32]) -> Result<BTreeMap<u32, String>, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteSourceKind {
    BlockchainCom,
    Blockchair,
    BCoin,
}

impl RemoteSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteSourceKind::BlockchainCom => "blockchain.com",
            RemoteSourceKind::Blockchair => "blockchair",
            RemoteSourceKind::BCoin => "bcoin",
        }
    }
}

impl std::fmt::Display for RemoteSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn select(network: NetworkType, sync_mode: SyncMode) -> KitResult<Option<RemoteSourceKind>> {
    match (network, sync_mode) {
        (NetworkType::RegTest, SyncMode::Blockchair) => Err(KitError::UnsupportedConfiguration(
            "blockchair sync is not available on regtest".into(),
        )),
        (NetworkType::RegTest, _) => Ok(None),
        (NetworkType::MainNet, SyncMode::Blockchair) => Ok(Some(RemoteSourceKind::Blockchair)),
        (NetworkType::MainNet, _) => Ok(Some(RemoteSourceKind::BlockchainCom)),
        (NetworkType::TestNet, _) => Ok(Some(RemoteSourceKind::BCoin)),
    }
}

pub fn http_client() -> KitResult<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| KitError::Remote(format!("http client: {}", e)))
}

/// Build (never call) the clients for `kind`.
pub fn connect(
    kind: RemoteSourceKind,
    network: &NetworkIdentity,
    checkpoint: &Checkpoint,
) -> KitResult<Arc<dyn ApiTransactionProvider>> {
    let client = http_client()?;
    let hs: Arc<dyn BlockHashFetcher> = Arc::new(HsBlockHashFetcher::new(client.clone(), HS_HASHES_URL));
    debug!("Connecting remote source {} (checkpoint {})", kind, checkpoint.height());

    let provider: Arc<dyn ApiTransactionProvider> = match kind {
        RemoteSourceKind::BlockchainCom => Arc::new(BlockchainComApi::new(client, BLOCKCHAIN_COM_URL, hs)),
        RemoteSourceKind::Blockchair => {
            if network.remote_chain_id.is_empty() {
                return Err(KitError::UnsupportedConfiguration(format!("{} has no Blockchair chain", network.name)));
            }
            let secondary = Arc::new(BlockchairBlockHashFetcher::new(client.clone(), BLOCKCHAIR_URL, network.remote_chain_id));
            let fetcher = Arc::new(CompositeBlockHashFetcher::new(hs, secondary, checkpoint.height()));
            Arc::new(BlockchairApi::new(client, BLOCKCHAIR_URL, network.remote_chain_id, fetcher))
        }
        RemoteSourceKind::BCoin => Arc::new(BCoinApi::new(client, BCOIN_TESTNET_URL)),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_table() {
        use NetworkType::*;
        use SyncMode::*;
        assert_eq!(select(MainNet, Api).unwrap(), Some(RemoteSourceKind::BlockchainCom));
        assert_eq!(select(MainNet, Full).unwrap(), Some(RemoteSourceKind::BlockchainCom));
        assert_eq!(select(MainNet, Blockchair).unwrap(), Some(RemoteSourceKind::Blockchair));
        for mode in SyncMode::ALL {
            assert_eq!(select(TestNet, mode).unwrap(), Some(RemoteSourceKind::BCoin));
        }
        assert_eq!(select(RegTest, Api).unwrap(), None);
        assert_eq!(select(RegTest, Full).unwrap(), None);
        assert!(matches!(select(RegTest, Blockchair), Err(KitError::UnsupportedConfiguration(_))));
    }

    #[test]
    fn connect_builds_named_providers() {
        let main = NetworkType::MainNet.identity();
        let checkpoint = Checkpoint::last(NetworkType::MainNet);
        assert_eq!(connect(RemoteSourceKind::BlockchainCom, main, &checkpoint).unwrap().name(), "blockchain.com");
        assert_eq!(connect(RemoteSourceKind::Blockchair, main, &checkpoint).unwrap().name(), "blockchair");

        let test = NetworkType::TestNet.identity();
        assert_eq!(connect(RemoteSourceKind::BCoin, test, &Checkpoint::last(NetworkType::TestNet)).unwrap().name(), "bcoin");
    }

    #[test]
    fn blockchair_needs_chain_id() {
        let reg = NetworkType::RegTest.identity();
        let checkpoint = Checkpoint::genesis(NetworkType::RegTest);
        assert!(matches!(
            connect(RemoteSourceKind::Blockchair, reg, &checkpoint),
            Err(KitError::UnsupportedConfiguration(_))
        ));
    }
}
