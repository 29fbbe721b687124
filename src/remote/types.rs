//! Wire-independent results shared by every remote source.

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiOutput {
    /// Locking script hex; empty when the source only reports addresses.
    pub script: String,
    pub address: Option<String>,
}

/// One transaction touching a restore address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTransactionItem {
    pub block_hash: String,
    pub block_height: u32,
    pub outputs: Vec<ApiOutput>,
}

/// Transaction found before its block hash is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingTransaction {
    pub block_height: u32,
    pub outputs: Vec<ApiOutput>,
}
