//! blockchain.com multiaddr API (main network, api/full sync).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::hash_fetcher::with_block_hashes;
use super::types::{ApiError, ApiOutput, ApiTransactionItem, PendingTransaction};
use super::{ApiTransactionProvider, BlockHashFetcher};

pub const BLOCKCHAIN_COM_URL: &str = "https://blockchain.info";

const ADDRESSES_PER_REQUEST: usize = 50;
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct MultiAddress {
    #[serde(default)]
    txs: Vec<MultiAddressTx>,
}

#[derive(Debug, Deserialize)]
struct MultiAddressTx {
    block_height: Option<u32>,
    #[serde(default)]
    out: Vec<MultiAddressOutput>,
}

#[derive(Debug, Deserialize)]
struct MultiAddressOutput {
    #[serde(default)]
    script: String,
    addr: Option<String>,
}

/// Returns the confirmed transactions of one page and the raw page length.
pub(crate) fn parse_multiaddr(body: &str) -> Result<(Vec<PendingTransaction>, usize), ApiError> {
    let page: MultiAddress = serde_json::from_str(body)?;
    let len = page.txs.len();
    let confirmed = page
        .txs
        .into_iter()
        .filter_map(|tx| {
            let block_height = tx.block_height?;
            let outputs = tx.out.into_iter().map(|o| ApiOutput { script: o.script, address: o.addr }).collect();
            Some(PendingTransaction { block_height, outputs })
        })
        .collect();
    Ok((confirmed, len))
}

#[derive(Clone)]
pub struct BlockchainComApi {
    client: Client,
    url: String,
    hash_fetcher: Arc<dyn BlockHashFetcher>,
}

impl BlockchainComApi {
    pub fn new(client: Client, url: impl Into<String>, hash_fetcher: Arc<dyn BlockHashFetcher>) -> Self {
        Self { client, url: url.into(), hash_fetcher }
    }

    pub(crate) fn request_url(&self, addresses: &[String], offset: usize) -> String {
        format!("{}/multiaddr?active={}&n={}&offset={}", self.url, addresses.join("|"), PAGE_SIZE, offset)
    }

    async fn fetch_chunk(&self, addresses: &[String]) -> Result<Vec<PendingTransaction>, ApiError> {
        let mut found = Vec::new();
        let mut offset = 0;
        loop {
            let url = self.request_url(addresses, offset);
            debug!("blockchain.com page offset {} for {} addresses", offset, addresses.len());

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(ApiError::Status(response.status().as_u16()));
            }
            let (page, len) = parse_multiaddr(&response.text().await?)?;
            found.extend(page);

            if len < PAGE_SIZE {
                return Ok(found);
            }
            offset += PAGE_SIZE;
        }
    }
}

#[async_trait]
impl ApiTransactionProvider for BlockchainComApi {
    fn name(&self) -> &'static str { "blockchain.com" }

    async fn transactions(&self, addresses: &[String], stop_height: Option<u32>) -> Result<Vec<ApiTransactionItem>, ApiError> {
        let mut pending = Vec::new();
        for chunk in addresses.chunks(ADDRESSES_PER_REQUEST) {
            pending.extend(self.fetch_chunk(chunk).await?);
        }
        pending.retain(|tx| stop_height.map_or(true, |stop| tx.block_height > stop));
        with_block_hashes(self.hash_fetcher.as_ref(), pending).await
    }
}
