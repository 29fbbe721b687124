//! Block hash lookups by height.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::types::{ApiError, ApiTransactionItem, PendingTransaction};
use super::BlockHashFetcher;

pub const HS_HASHES_URL: &str = "https://api.blocksdecoded.com/v1/blockchains/bitcoin";

/// blocksdecoded hash service: `GET {url}/hashes?numbers=1,2,3`
#[derive(Clone)]
pub struct HsBlockHashFetcher {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct HsHashItem {
    number: u32,
    hash: String,
}

impl HsBlockHashFetcher {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }

    pub(crate) fn request_url(&self, heights: &[u32]) -> String {
        let numbers: Vec<String> = heights.iter().map(|h| h.to_string()).collect();
        format!("{}/hashes?numbers={}", self.url, numbers.join(","))
    }
}

pub(crate) fn parse_hs_hashes(body: &str) -> Result<BTreeMap<u32, String>, ApiError> {
    let items: Vec<HsHashItem> = serde_json::from_str(body)?;
    Ok(items.into_iter().map(|item| (item.number, item.hash)).collect())
}

#[async_trait]
impl BlockHashFetcher for HsBlockHashFetcher {
    fn name(&self) -> &'static str { "blocksdecoded" }

    async fn fetch(&self, heights: &[u32]) -> Result<BTreeMap<u32, String>, ApiError> {
        if heights.is_empty() {
            return Ok(BTreeMap::new());
        }
        let url = self.request_url(heights);
        debug!("Fetching {} block hashes from {}", heights.len(), url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        parse_hs_hashes(&response.text().await?)
    }
}

/// Blockchair block dashboards: `GET {url}/{chain}/dashboards/blocks/1,2,3`
#[derive(Clone)]
pub struct BlockchairBlockHashFetcher {
    client: Client,
    url: String,
    chain_id: String,
}

impl BlockchairBlockHashFetcher {
    pub fn new(client: Client, url: impl Into<String>, chain_id: impl Into<String>) -> Self {
        Self { client, url: url.into(), chain_id: chain_id.into() }
    }

    pub(crate) fn request_url(&self, heights: &[u32]) -> String {
        let ids: Vec<String> = heights.iter().map(|h| h.to_string()).collect();
        format!("{}/{}/dashboards/blocks/{}", self.url, self.chain_id, ids.join(","))
    }
}

/// `{"data": {"<height>": {"block": {"id": <height>, "hash": "<hash>"}}}}`
pub(crate) fn parse_blockchair_hashes(body: &str) -> Result<BTreeMap<u32, String>, ApiError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let data = value
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| ApiError::UnexpectedResponse("missing data".into()))?;

    let mut hashes = BTreeMap::new();
    for entry in data.values() {
        let block = &entry["block"];
        if let (Some(id), Some(hash)) = (block["id"].as_u64(), block["hash"].as_str()) {
            let height = u32::try_from(id).map_err(|_| ApiError::UnexpectedResponse(format!("block id {} out of range", id)))?;
            hashes.insert(height, hash.to_string());
        }
    }
    Ok(hashes)
}

#[async_trait]
impl BlockHashFetcher for BlockchairBlockHashFetcher {
    fn name(&self) -> &'static str { "blockchair" }

    async fn fetch(&self, heights: &[u32]) -> Result<BTreeMap<u32, String>, ApiError> {
        if heights.is_empty() {
            return Ok(BTreeMap::new());
        }
        let url = self.request_url(heights);
        debug!("Fetching {} block hashes from {}", heights.len(), url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        parse_blockchair_hashes(&response.text().await?)
    }
}

/// Primary source for every height; heights at or above the checkpoint that the primary
/// misses (or fails on) are retried against the secondary.
pub struct CompositeBlockHashFetcher {
    primary: Arc<dyn BlockHashFetcher>,
    secondary: Arc<dyn BlockHashFetcher>,
    checkpoint_height: u32,
}

impl CompositeBlockHashFetcher {
    pub fn new(primary: Arc<dyn BlockHashFetcher>, secondary: Arc<dyn BlockHashFetcher>, checkpoint_height: u32) -> Self {
        Self { primary, secondary, checkpoint_height }
    }

    pub fn checkpoint_height(&self) -> u32 { self.checkpoint_height }
}

#[async_trait]
impl BlockHashFetcher for CompositeBlockHashFetcher {
    fn name(&self) -> &'static str { "composite" }

    async fn fetch(&self, heights: &[u32]) -> Result<BTreeMap<u32, String>, ApiError> {
        let (old, recent): (Vec<u32>, Vec<u32>) = heights.iter().copied().partition(|h| *h < self.checkpoint_height);

        let mut hashes = if old.is_empty() { BTreeMap::new() } else { self.primary.fetch(&old).await? };
        if recent.is_empty() {
            return Ok(hashes);
        }

        let primary_recent = match self.primary.fetch(&recent).await {
            Ok(found) => found,
            Err(e) => {
                warn!("{} failed from checkpoint {}: {}", self.primary.name(), self.checkpoint_height, e);
                BTreeMap::new()
            }
        };
        let missing: Vec<u32> = recent.iter().copied().filter(|h| !primary_recent.contains_key(h)).collect();
        hashes.extend(primary_recent);

        if !missing.is_empty() {
            debug!("Falling back to {} for {} heights", self.secondary.name(), missing.len());
            hashes.extend(self.secondary.fetch(&missing).await?);
        }
        Ok(hashes)
    }
}

/// Attach block hashes to transactions; transactions whose hash is unknown are dropped.
pub(crate) async fn with_block_hashes(
    fetcher: &dyn BlockHashFetcher,
    pending: Vec<PendingTransaction>,
) -> Result<Vec<ApiTransactionItem>, ApiError> {
    let heights: Vec<u32> = pending.iter().map(|t| t.block_height).collect::<BTreeSet<_>>().into_iter().collect();
    let hashes = fetcher.fetch(&heights).await?;

    Ok(pending
        .into_iter()
        .filter_map(|tx| {
            let block_hash = hashes.get(&tx.block_height)?.clone();
            Some(ApiTransactionItem { block_hash, block_height: tx.block_height, outputs: tx.outputs })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct MockFetcher {
        name: &'static str,
        known: BTreeMap<u32, String>,
        fail: bool,
        calls: Mutex<Vec<Vec<u32>>>,
    }

    impl MockFetcher {
        fn new(name: &'static str, heights: &[u32], fail: bool) -> Arc<Self> {
            let known = heights.iter().map(|h| (*h, format!("{}-{}", name, h))).collect();
            Arc::new(Self { name, known, fail, calls: Mutex::new(vec![]) })
        }

        fn calls(&self) -> Vec<Vec<u32>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BlockHashFetcher for MockFetcher {
        fn name(&self) -> &'static str { self.name }

        async fn fetch(&self, heights: &[u32]) -> Result<BTreeMap<u32, String>, ApiError> {
            self.calls.lock().unwrap().push(heights.to_vec());
            if self.fail {
                return Err(ApiError::Status(503));
            }
            Ok(heights.iter().filter_map(|h| self.known.get(h).map(|v| (*h, v.clone()))).collect())
        }
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Runtime::new().expect("runtime").block_on(future)
    }

    #[test]
    fn below_checkpoint_uses_primary_only() {
        let primary = MockFetcher::new("hs", &[10, 20], false);
        let secondary = MockFetcher::new("chair", &[10, 20], false);
        let composite = CompositeBlockHashFetcher::new(primary.clone(), secondary.clone(), 100);

        let hashes = block_on(composite.fetch(&[10, 20])).unwrap();
        assert_eq!(hashes.get(&10).map(String::as_str), Some("hs-10"));
        assert!(secondary.calls().is_empty());
    }

    #[test]
    fn above_checkpoint_falls_back_for_missing() {
        let primary = MockFetcher::new("hs", &[10, 150], false);
        let secondary = MockFetcher::new("chair", &[150, 160], false);
        let composite = CompositeBlockHashFetcher::new(primary.clone(), secondary.clone(), 100);

        let hashes = block_on(composite.fetch(&[10, 150, 160])).unwrap();
        assert_eq!(hashes.get(&150).map(String::as_str), Some("hs-150"));
        assert_eq!(hashes.get(&160).map(String::as_str), Some("chair-160"));
        assert_eq!(secondary.calls(), vec![vec![160]]);
    }

    #[test]
    fn checkpoint_height_uses_fallback() {
        let primary = MockFetcher::new("hs", &[99], false);
        let secondary = MockFetcher::new("chair", &[100], false);
        let composite = CompositeBlockHashFetcher::new(primary.clone(), secondary.clone(), 100);

        let hashes = block_on(composite.fetch(&[99, 100])).unwrap();
        assert_eq!(hashes.get(&99).map(String::as_str), Some("hs-99"));
        assert_eq!(hashes.get(&100).map(String::as_str), Some("chair-100"));
        assert_eq!(primary.calls(), vec![vec![99], vec![100]]);
        assert_eq!(secondary.calls(), vec![vec![100]]);
    }

    #[test]
    fn primary_failure_above_checkpoint_is_recovered() {
        let primary = MockFetcher::new("hs", &[], true);
        let secondary = MockFetcher::new("chair", &[150], false);
        let composite = CompositeBlockHashFetcher::new(primary, secondary, 100);

        let hashes = block_on(composite.fetch(&[150])).unwrap();
        assert_eq!(hashes.get(&150).map(String::as_str), Some("chair-150"));
    }

    #[test]
    fn drops_transactions_without_hash() {
        let fetcher = MockFetcher::new("hs", &[5], false);
        let pending = vec![
            PendingTransaction { block_height: 5, outputs: vec![] },
            PendingTransaction { block_height: 6, outputs: vec![] },
        ];
        let items = block_on(with_block_hashes(fetcher.as_ref(), pending)).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].block_hash, "hs-5");
        assert_eq!(fetcher.calls(), vec![vec![5, 6]]);
    }

    #[test]
    fn parses_wire_formats() {
        let hs = parse_hs_hashes(r#"[{"number": 1, "hash": "aa"}, {"number": 2, "hash": "bb"}]"#).unwrap();
        assert_eq!(hs.get(&2).map(String::as_str), Some("bb"));

        let chair = parse_blockchair_hashes(
            r#"{"data": {"7": {"block": {"id": 7, "hash": "cc"}}, "8": {"block": {"id": 8, "hash": "dd"}}}, "context": {}}"#,
        )
        .unwrap();
        assert_eq!(chair.len(), 2);
        assert_eq!(chair.get(&8).map(String::as_str), Some("dd"));

        assert!(parse_blockchair_hashes(r#"{"context": {}}"#).is_err());
        assert!(matches!(
            parse_blockchair_hashes(r#"{"data": {"x": {"block": {"id": 4294967296, "hash": "ee"}}}}"#),
            Err(ApiError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn request_urls() {
        let hs = HsBlockHashFetcher::new(Client::new(), HS_HASHES_URL);
        assert_eq!(hs.request_url(&[1, 2]), format!("{}/hashes?numbers=1,2", HS_HASHES_URL));

        let chair = BlockchairBlockHashFetcher::new(Client::new(), "https://api.blockchair.com", "bitcoin");
        assert_eq!(chair.request_url(&[3]), "https://api.blockchair.com/bitcoin/dashboards/blocks/3");
    }
}
