//! On-disk layout: `{root}/bitcoin-kit/{walletId}-{network}-{purpose}-{syncMode}.json`

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{JsonFileStorage, WalletSessionKey};
use crate::errors::KitResult;
use crate::network::NetworkType;
use crate::purpose::Purpose;
use crate::sync::SyncMode;

pub const ROOT_ENV: &str = "BITCOIN_KIT_ROOT";
pub const KIT_DIR: &str = "bitcoin-kit";

/// Storage directory. `BITCOIN_KIT_ROOT` overrides the platform data dir.
pub fn data_dir() -> PathBuf {
    let root = std::env::var(ROOT_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")));
    root.join(KIT_DIR)
}

pub fn session_path(dir: &Path, key: &WalletSessionKey) -> PathBuf {
    dir.join(key.file_name())
}

pub fn open_session(dir: &Path, key: &WalletSessionKey) -> KitResult<JsonFileStorage> {
    std::fs::create_dir_all(dir)?;
    JsonFileStorage::open(session_path(dir, key))
}

/// Remove the session file of a composition that failed.
pub fn discard_session(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Discarded {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not discard {}: {}", path.display(), e),
    }
}

/// Wallet id of a session file such as `w-x-mainNet-bip84-api.json`, parsed from the right.
pub fn session_wallet_id(file_name: &str) -> Option<&str> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(4, '-');
    let (mode, purpose, network, id) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);

    let known = SyncMode::ALL.iter().any(|m| m.as_str() == mode)
        && Purpose::ALL.iter().any(|p| p.as_str() == purpose)
        && NetworkType::ALL.iter().any(|n| n.as_str() == network);
    (known && !id.is_empty()).then_some(id)
}

/// Delete every session in `dir` whose wallet id is not in `except`. Returns the number removed.
pub fn clear(dir: &Path, except: &[String]) -> KitResult<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if session_wallet_id(&name).is_some_and(|id| except.iter().any(|kept| kept == id)) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NetworkType;
    use crate::purpose::Purpose;
    use crate::storage::Storage;
    use crate::sync::SyncMode;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;
    use tempfile::TempDir;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn key(id: &str) -> WalletSessionKey {
        WalletSessionKey::new(id, NetworkType::MainNet, Purpose::Bip84, SyncMode::Api).unwrap()
    }

    #[test]
    fn root_env_override() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let dir = TempDir::new().expect("tempdir");
        std::env::set_var(ROOT_ENV, dir.path());
        assert_eq!(data_dir(), dir.path().join(KIT_DIR));
        std::env::remove_var(ROOT_ENV);
    }

    #[test]
    fn clear_keeps_excepted_wallets() {
        let dir = TempDir::new().expect("tempdir");
        for id in ["keep", "drop1", "drop2"] {
            open_session(dir.path(), &key(id)).unwrap().set_value("x", "1").unwrap();
        }

        let removed = clear(dir.path(), &["keep".to_string()]).unwrap();
        assert_eq!(removed, 2);
        assert!(session_path(dir.path(), &key("keep")).exists());
        assert!(!session_path(dir.path(), &key("drop1")).exists());
    }

    #[test]
    fn clear_matches_wallet_id_exactly() {
        let dir = TempDir::new().expect("tempdir");
        for id in ["w", "w-x"] {
            open_session(dir.path(), &key(id)).unwrap().set_value("x", "1").unwrap();
        }
        std::fs::write(dir.path().join("w-mainNet-bip84-api.bdk"), b"db").unwrap();

        assert_eq!(clear(dir.path(), &["w".to_string()]).unwrap(), 1);
        assert!(session_path(dir.path(), &key("w")).exists());
        assert!(dir.path().join("w-mainNet-bip84-api.bdk").exists());
        assert!(!session_path(dir.path(), &key("w-x")).exists());
    }

    #[test]
    fn session_file_names_parse_from_the_right() {
        assert_eq!(session_wallet_id("w-x-mainNet-bip84-api.json"), Some("w-x"));
        assert_eq!(session_wallet_id("w-testNet-bip44-blockchair.bdk"), Some("w"));
        assert_eq!(session_wallet_id("w-mainNet-bip84.json"), None);
        assert_eq!(session_wallet_id("w-x-mainNet-bip84-fast.json"), None);
        assert_eq!(session_wallet_id("notes.txt"), None);
    }

    #[test]
    fn clear_missing_dir_is_noop() {
        let dir = TempDir::new().expect("tempdir");
        assert_eq!(clear(&dir.path().join("absent"), &[]).unwrap(), 0);
    }
}
