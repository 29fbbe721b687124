//! JsonFileStorage - whole-state JSON file, rewritten on every change.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::Storage;
use crate::block::Block;
use crate::checkpoint::Checkpoint;
use crate::errors::{KitError, KitResult};

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageState {
    blocks: BTreeMap<u32, Block>,
    checkpoint: Option<Checkpoint>,
    values: BTreeMap<String, String>,
}

pub struct JsonFileStorage {
    path: Option<PathBuf>,
    state: Mutex<StorageState>,
}

impl JsonFileStorage {
    /// Load state from `path` if it exists. The file is only created on first write.
    pub fn open(path: impl Into<PathBuf>) -> KitResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes).map_err(|e| KitError::Storage(format!("{}: {}", path.display(), e)))?
        } else {
            StorageState::default()
        };
        Ok(Self { path: Some(path), state: Mutex::new(state) })
    }

    pub fn in_memory() -> Self {
        Self { path: None, state: Mutex::new(StorageState::default()) }
    }

    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    fn update<F: FnOnce(&mut StorageState)>(&self, f: F) -> KitResult<()> {
        let mut state = self.state.lock().map_err(|_| KitError::Storage("lock".into()))?;
        f(&mut state);
        let Some(ref path) = self.path else { return Ok(()) };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec(&*state).map_err(|e| KitError::Storage(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

impl Storage for JsonFileStorage {
    fn block(&self, height: u32) -> Option<Block> {
        self.state.lock().ok()?.blocks.get(&height).copied()
    }

    fn last_block(&self) -> Option<Block> {
        self.state.lock().ok()?.blocks.values().next_back().copied()
    }

    fn add_blocks(&self, blocks: &[Block]) -> KitResult<()> {
        self.update(|state| {
            for block in blocks {
                state.blocks.insert(block.height, *block);
            }
        })
    }

    fn timestamps(&self, from: u32, to: u32) -> Vec<u32> {
        match self.state.lock() {
            Ok(state) if from <= to => state.blocks.range(from..=to).map(|(_, b)| b.timestamp()).collect(),
            _ => vec![],
        }
    }

    fn checkpoint(&self) -> Option<Checkpoint> {
        self.state.lock().ok()?.checkpoint
    }

    fn save_checkpoint(&self, checkpoint: &Checkpoint) -> KitResult<()> {
        let checkpoint = *checkpoint;
        self.update(|state| state.checkpoint = Some(checkpoint))
    }

    fn value(&self, key: &str) -> Option<String> {
        self.state.lock().ok()?.values.get(key).cloned()
    }

    fn set_value(&self, key: &str, value: &str) -> KitResult<()> {
        self.update(|state| {
            state.values.insert(key.to_string(), value.to_string());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockHeader;
    use crate::network::NetworkType;
    use bitcoin::hashes::Hash;
    use bitcoin::BlockHash;
    use tempfile::TempDir;

    fn block(height: u32, timestamp: u32) -> Block {
        Block::new(
            height,
            BlockHeader { hash: BlockHash::all_zeros(), prev_hash: BlockHash::all_zeros(), timestamp, bits: 0x1d00ffff },
        )
    }

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("wallet.json");

        {
            let storage = JsonFileStorage::open(&path).expect("open");
            assert!(!path.exists(), "open must not create the file");
            storage.add_blocks(&[block(1, 100), block(2, 200)]).unwrap();
            storage.save_checkpoint(&Checkpoint::genesis(NetworkType::MainNet)).unwrap();
            storage.set_value("k", "v").unwrap();
        }

        let storage = JsonFileStorage::open(&path).expect("reopen");
        assert_eq!(storage.last_block().map(|b| b.height), Some(2));
        assert_eq!(storage.checkpoint(), Some(Checkpoint::genesis(NetworkType::MainNet)));
        assert_eq!(storage.value("k").as_deref(), Some("v"));
    }

    #[test]
    fn timestamps_in_height_order() {
        let storage = JsonFileStorage::in_memory();
        storage.add_blocks(&[block(5, 50), block(3, 30), block(4, 40)]).unwrap();
        assert_eq!(storage.timestamps(3, 5), vec![30, 40, 50]);
        assert_eq!(storage.timestamps(4, 100), vec![40, 50]);
        assert!(storage.timestamps(6, 5).is_empty());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(JsonFileStorage::open(&path), Err(KitError::Storage(_))));
    }
}
