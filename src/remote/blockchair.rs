//! Blockchair address dashboards (main network, blockchair sync).

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::hash_fetcher::with_block_hashes;
use super::types::{ApiError, ApiOutput, ApiTransactionItem, PendingTransaction};
use super::{ApiTransactionProvider, BlockHashFetcher};

pub const BLOCKCHAIR_URL: &str = "https://api.blockchair.com";

const ADDRESSES_PER_REQUEST: usize = 100;
const PAGE_SIZE: usize = 1000;

#[derive(Clone)]
pub struct BlockchairApi {
    client: Client,
    url: String,
    chain_id: String,
    hash_fetcher: Arc<dyn BlockHashFetcher>,
}

/// `data.transactions[] = {block_id, hash, address, balance_change}`; mempool entries have `block_id = -1`.
pub(crate) fn parse_address_dashboard(body: &str) -> Result<(Vec<PendingTransaction>, usize), ApiError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let transactions = value["data"]["transactions"]
        .as_array()
        .ok_or_else(|| ApiError::UnexpectedResponse("missing data.transactions".into()))?;

    let confirmed = transactions
        .iter()
        .filter_map(|tx| {
            let block_height = u32::try_from(tx["block_id"].as_i64()?).ok()?;
            let address = tx["address"].as_str().map(str::to_string);
            Some(PendingTransaction { block_height, outputs: vec![ApiOutput { script: String::new(), address }] })
        })
        .collect();
    Ok((confirmed, transactions.len()))
}

impl BlockchairApi {
    pub fn new(client: Client, url: impl Into<String>, chain_id: impl Into<String>, hash_fetcher: Arc<dyn BlockHashFetcher>) -> Self {
        Self { client, url: url.into(), chain_id: chain_id.into(), hash_fetcher }
    }

    pub(crate) fn request_url(&self, addresses: &[String], offset: usize) -> String {
        format!(
            "{}/{}/dashboards/addresses/{}?limit=0,{}&offset=0,{}&transaction_details=true",
            self.url,
            self.chain_id,
            addresses.join(","),
            PAGE_SIZE,
            offset
        )
    }

    async fn fetch_chunk(&self, addresses: &[String]) -> Result<Vec<PendingTransaction>, ApiError> {
        let mut found = Vec::new();
        let mut offset = 0;
        loop {
            let url = self.request_url(addresses, offset);
            debug!("Blockchair page offset {} for {} addresses", offset, addresses.len());

            let response = self.client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(ApiError::Status(response.status().as_u16()));
            }
            let (page, len) = parse_address_dashboard(&response.text().await?)?;
            found.extend(page);

            if len < PAGE_SIZE {
                return Ok(found);
            }
            offset += PAGE_SIZE;
        }
    }
}

#[async_trait]
impl ApiTransactionProvider for BlockchairApi {
    fn name(&self) -> &'static str { "blockchair" }

    async fn transactions(&self, addresses: &[String], stop_height: Option<u32>) -> Result<Vec<ApiTransactionItem>, ApiError> {
        let mut pending = Vec::new();
        for chunk in addresses.chunks(ADDRESSES_PER_REQUEST) {
            pending.extend(self.fetch_chunk(chunk).await?);
        }
        pending.retain(|tx| stop_height.map_or(true, |stop| tx.block_height > stop));
        with_block_hashes(self.hash_fetcher.as_ref(), pending).await
    }
}
