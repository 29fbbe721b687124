//! BCoin indexer API (test network).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::types::{ApiError, ApiOutput, ApiTransactionItem};
use super::ApiTransactionProvider;

pub const BCOIN_TESTNET_URL: &str = "https://btc-testnet.horizontalsystems.xyz/api";

#[derive(Debug, Deserialize)]
struct BCoinTx {
    block: Option<String>,
    height: i64,
    #[serde(default)]
    outputs: Vec<BCoinOutput>,
}

#[derive(Debug, Deserialize)]
struct BCoinOutput {
    #[serde(default)]
    script: String,
    address: Option<String>,
}

/// Confirmed entries only; BCoin reports mempool transactions with `height = -1`.
pub(crate) fn parse_transactions(body: &str) -> Result<Vec<ApiTransactionItem>, ApiError> {
    let txs: Vec<BCoinTx> = serde_json::from_str(body)?;
    Ok(txs
        .into_iter()
        .filter_map(|tx| {
            let block_height = u32::try_from(tx.height).ok()?;
            let outputs = tx.outputs.into_iter().map(|o| ApiOutput { script: o.script, address: o.address }).collect();
            Some(ApiTransactionItem { block_hash: tx.block?, block_height, outputs })
        })
        .collect())
}

#[derive(Clone)]
pub struct BCoinApi {
    client: Client,
    url: String,
}

impl BCoinApi {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl ApiTransactionProvider for BCoinApi {
    fn name(&self) -> &'static str { "bcoin" }

    async fn transactions(&self, addresses: &[String], stop_height: Option<u32>) -> Result<Vec<ApiTransactionItem>, ApiError> {
        let url = format!("{}/tx/address", self.url);
        debug!("BCoin lookup for {} addresses", addresses.len());

        let response = self.client.post(&url).json(&json!({ "addresses": addresses })).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        let mut items = parse_transactions(&response.text().await?)?;
        items.retain(|tx| stop_height.map_or(true, |stop| tx.block_height > stop));
        Ok(items)
    }
}
