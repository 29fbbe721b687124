//! Storage - the persistence interface composition needs, plus a JSON-file backend.
//!
//! The sync engine owns block storage; composition only reads blocks (validators),
//! reads/writes the checkpoint, and keeps a few key/value flags.

mod file;
#[cfg(feature = "native")]
pub mod paths;
mod session;

use crate::block::Block;
use crate::checkpoint::Checkpoint;
use crate::errors::KitResult;

pub use file::JsonFileStorage;
pub use session::WalletSessionKey;
pub(crate) use session::validate_wallet_id;

pub trait Storage: Send + Sync {
    fn block(&self, height: u32) -> Option<Block>;
    fn last_block(&self) -> Option<Block>;
    fn add_blocks(&self, blocks: &[Block]) -> KitResult<()>;
    /// Timestamps of stored blocks with height in `from..=to`, ascending by height.
    fn timestamps(&self, from: u32, to: u32) -> Vec<u32>;

    fn checkpoint(&self) -> Option<Checkpoint>;
    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> KitResult<()>;

    fn value(&self, key: &str) -> Option<String>;
    fn set_value(&self, key: &str, value: &str) -> KitResult<()>;
}
