//! Wallet engine - BDK 2.x behind the kit's `SyncEngine` seam.
//!
//! # Architecture
//!
//! ```text
//! Kit::from_*(.., BdkEngineBuilder)
//!     │
//!     └── EngineConfig → BdkEngine
//!                          │
//!                          ├── descriptors from purpose + extended key
//!                          ├── discover() → ApiTransactionProvider (above the checkpoint)
//!                          │
//!                          ▼
//!                    bdk_file_store ({storage name}.bdk)
//! ```
//!
//! Watch-address sessions are rejected; BDK needs a descriptor key.

mod bdk;

pub use bdk::{BdkEngine, BdkEngineBuilder, TransactionDetails, UtxoDetails, WalletBalance};
