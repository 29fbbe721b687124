//! BDK engine - bdk_wallet 2.x behind the `SyncEngine` seam, with file-based persistence.
//!
//! Descriptors follow the composed purpose: bip44 `pkh`, bip49 `sh(wpkh)`, bip84 `wpkh`, bip86 `tr`.
//! Master keys derive the account path themselves; account keys (depth 3) are used as-is.

use std::path::PathBuf;
use std::sync::Mutex;

use bdk_wallet::{
    bitcoin::{Address, Network},
    file_store::Store as FileStore,
    ChangeSet, KeychainKind, PersistedWallet, Wallet,
};
use tracing::{debug, info};

use crate::errors::{KitError, KitResult};
use crate::keys::{ExtendedKey, KeyMaterial};
use crate::kit::{EngineConfig, SyncEngine, SyncEngineBuilder};
use crate::network::NetworkType;
use crate::purpose::Purpose;
use crate::restore::RestoreKeyConverter;

const MAGIC: &[u8] = b"btckit00";
const DEFAULT_GAP_LIMIT: u32 = 20;

type PW = PersistedWallet<FileStore<ChangeSet>>;

#[derive(Debug, Clone, Default)]
pub struct WalletBalance {
    pub confirmed: u64,
    pub trusted_pending: u64,
    pub untrusted_pending: u64,
    pub immature: u64,
}

#[derive(Debug, Clone)]
pub struct TransactionDetails {
    pub txid: String,
    pub received: u64,
    pub sent: u64,
    pub fee: Option<u64>,
    pub confirmed: bool,
    pub timestamp: Option<u64>,
    pub block_height: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct UtxoDetails {
    pub txid: String,
    pub vout: u32,
    pub amount_sat: u64,
    pub address: Option<String>,
    pub is_change: bool,
}

fn bdk_network(network: NetworkType) -> Network {
    match network {
        NetworkType::MainNet => Network::Bitcoin,
        NetworkType::TestNet => Network::Testnet,
        NetworkType::RegTest => Network::Regtest,
    }
}

/// External and internal descriptors for `key` under `purpose`.
pub(crate) fn descriptors(key: &ExtendedKey, purpose: Purpose, network: NetworkType) -> KitResult<(String, String)> {
    let origin = match key.depth() {
        0 if key.is_private() => {
            format!("/{}h/{}h/0h", purpose.number(), network.identity().coin_type)
        }
        3 => String::new(),
        depth => {
            return Err(KitError::UnsupportedConfiguration(format!(
                "BDK engine needs a private master key or an account key, got depth {}",
                depth
            )))
        }
    };
    let encoded = key.standard_encoding();
    let wrap = |chain: u32| {
        let inner = format!("{}{}/{}/*", encoded, origin, chain);
        match purpose {
            Purpose::Bip44 => format!("pkh({})", inner),
            Purpose::Bip49 => format!("sh(wpkh({}))", inner),
            Purpose::Bip84 => format!("wpkh({})", inner),
            Purpose::Bip86 => format!("tr({})", inner),
        }
    };
    Ok((wrap(0), wrap(1)))
}

/// Builds a [`BdkEngine`]; the wallet file sits next to the kit's JSON storage unless overridden.
#[derive(Debug, Clone, Default)]
pub struct BdkEngineBuilder {
    db_path: Option<PathBuf>,
    gap_limit: Option<u32>,
}

impl BdkEngineBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self { self.db_path = Some(path.into()); self }
    pub fn with_gap_limit(mut self, gap: u32) -> Self { self.gap_limit = Some(gap); self }
}

impl SyncEngineBuilder for BdkEngineBuilder {
    type Engine = BdkEngine;

    fn build(self, config: EngineConfig) -> KitResult<BdkEngine> {
        let key = match &config.key_material {
            KeyMaterial::Extended(key) => key,
            KeyMaterial::WatchAddress(_) => {
                return Err(KitError::UnsupportedConfiguration("BDK engine cannot watch a single address".into()))
            }
        };
        let (external, internal) = descriptors(key, config.purpose, config.network_type)?;

        let db_path = match (self.db_path, &config.storage_path) {
            (Some(path), _) => path,
            (None, Some(storage)) => storage.with_extension("bdk"),
            (None, None) => return Err(KitError::Storage("no location for the BDK wallet file".into())),
        };
        let (wallet, db) = open_wallet(&external, &internal, bdk_network(config.network_type), &db_path)?;
        info!("BDK wallet ready at {}", db_path.display());

        Ok(BdkEngine {
            wallet: Mutex::new(wallet),
            db: Mutex::new(db),
            network: bdk_network(config.network_type),
            gap_limit: self.gap_limit.unwrap_or(DEFAULT_GAP_LIMIT),
            config,
            restore_key_converters: Vec::new(),
        })
    }
}

fn open_wallet(external: &str, internal: &str, network: Network, db_path: &std::path::Path) -> KitResult<(PW, FileStore<ChangeSet>)> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut db: FileStore<ChangeSet> = FileStore::load_or_create(MAGIC, db_path)
        .map_err(|e| KitError::Storage(format!("FileStore: {}", e)))?
        .0;

    let loaded = Wallet::load()
        .descriptor(KeychainKind::External, Some(external.to_string()))
        .descriptor(KeychainKind::Internal, Some(internal.to_string()))
        .extract_keys()
        .check_network(network)
        .load_wallet(&mut db)
        .map_err(|e| KitError::Storage(format!("Load wallet: {}", e)))?;

    if let Some(wallet) = loaded {
        return Ok((wallet, db));
    }

    let wallet = Wallet::create(external.to_string(), internal.to_string())
        .network(network)
        .create_wallet(&mut db)
        .map_err(|e| KitError::KeyDerivation(format!("Create wallet: {}", e)))?;
    Ok((wallet, db))
}

pub struct BdkEngine {
    wallet: Mutex<PW>,
    db: Mutex<FileStore<ChangeSet>>,
    network: Network,
    gap_limit: u32,
    config: EngineConfig,
    restore_key_converters: Vec<RestoreKeyConverter>,
}

impl BdkEngine {
    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn restore_key_converters(&self) -> &[RestoreKeyConverter] { &self.restore_key_converters }

    fn lock_wallet(&self) -> KitResult<std::sync::MutexGuard<'_, PW>> {
        self.wallet.lock().map_err(|_| KitError::Storage("wallet lock".into()))
    }

    fn persist(&self) -> KitResult<()> {
        let mut wallet = self.lock_wallet()?;
        let mut db = self.db.lock().map_err(|_| KitError::Storage("db lock".into()))?;
        wallet.persist(&mut *db).map_err(|e| KitError::Storage(format!("Persist: {}", e)))?;
        Ok(())
    }

    pub fn balance(&self) -> KitResult<WalletBalance> {
        let wallet = self.lock_wallet()?;
        let b = wallet.balance();
        Ok(WalletBalance {
            confirmed: b.confirmed.to_sat(),
            trusted_pending: b.trusted_pending.to_sat(),
            untrusted_pending: b.untrusted_pending.to_sat(),
            immature: b.immature.to_sat(),
        })
    }

    pub fn receive_address(&self) -> KitResult<String> {
        let addr = self.lock_wallet()?.next_unused_address(KeychainKind::External).address.to_string();
        self.persist()?;
        Ok(addr)
    }

    pub fn new_address(&self) -> KitResult<String> {
        let addr = self.lock_wallet()?.reveal_next_address(KeychainKind::External).address.to_string();
        self.persist()?;
        Ok(addr)
    }

    /// Unrevealed lookahead window, both keychains.
    fn lookahead(&self) -> KitResult<Vec<(KeychainKind, u32, String)>> {
        let wallet = self.lock_wallet()?;
        let mut addresses = Vec::new();
        for keychain in [KeychainKind::External, KeychainKind::Internal] {
            let start = wallet.derivation_index(keychain).map_or(0, |i| i + 1);
            for index in start..start + self.gap_limit {
                addresses.push((keychain, index, wallet.peek_address(keychain, index).address.to_string()));
            }
        }
        Ok(addresses)
    }

    /// One pass of API discovery: reveals addresses up to the highest one the remote source
    /// has seen above the checkpoint. Returns the number of matching transactions.
    pub async fn discover(&self) -> KitResult<usize> {
        if !self.config.api_sync_state.restore_from_api() {
            return Ok(0);
        }
        let provider = match &self.config.api_transaction_provider {
            Some(provider) => provider.clone(),
            None => return Ok(0),
        };

        let window = self.lookahead()?;
        let addresses: Vec<String> = window.iter().map(|(_, _, a)| a.clone()).collect();
        let items = provider
            .transactions(&addresses, Some(self.config.checkpoint.height()))
            .await
            .map_err(|e| KitError::Remote(format!("{}: {}", provider.name(), e)))?;
        debug!("{} returned {} transactions for {} addresses", provider.name(), items.len(), addresses.len());

        {
            let mut wallet = self.lock_wallet()?;
            for (keychain, index, address) in &window {
                let used = items
                    .iter()
                    .flat_map(|item| item.outputs.iter())
                    .any(|output| output.address.as_deref() == Some(address.as_str()));
                if used {
                    let _ = wallet.reveal_addresses_to(*keychain, *index).count();
                }
            }
        }
        self.persist()?;
        self.config.api_sync_state.set_restored(true)?;
        Ok(items.len())
    }

    pub fn transactions(&self, limit: usize) -> KitResult<Vec<TransactionDetails>> {
        let wallet = self.lock_wallet()?;
        Ok(wallet
            .transactions()
            .take(limit)
            .map(|tx| {
                let (confirmed, timestamp, block_height) = match tx.chain_position {
                    bdk_wallet::chain::ChainPosition::Confirmed { anchor, .. } => {
                        (true, Some(anchor.confirmation_time), Some(anchor.block_id.height))
                    }
                    bdk_wallet::chain::ChainPosition::Unconfirmed { .. } => (false, None, None),
                };
                let (sent, received) = wallet.sent_and_received(&tx.tx_node.tx);
                TransactionDetails {
                    txid: tx.tx_node.txid.to_string(),
                    received: received.to_sat(),
                    sent: sent.to_sat(),
                    fee: wallet.calculate_fee(&tx.tx_node.tx).ok().map(|f| f.to_sat()),
                    confirmed,
                    timestamp,
                    block_height,
                }
            })
            .collect())
    }

    pub fn list_unspent(&self) -> KitResult<Vec<UtxoDetails>> {
        let wallet = self.lock_wallet()?;
        Ok(wallet
            .list_unspent()
            .map(|utxo| UtxoDetails {
                txid: utxo.outpoint.txid.to_string(),
                vout: utxo.outpoint.vout,
                amount_sat: utxo.txout.value.to_sat(),
                address: Address::from_script(&utxo.txout.script_pubkey, self.network).ok().map(|a| a.to_string()),
                is_change: utxo.keychain == KeychainKind::Internal,
            })
            .collect())
    }
}

impl SyncEngine for BdkEngine {
    fn add_restore_key_converter(&mut self, converter: RestoreKeyConverter) {
        self.restore_key_converters.push(converter);
    }
}

impl std::fmt::Debug for BdkEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BdkEngine")
            .field("network", &self.network)
            .field("gap_limit", &self.gap_limit)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
