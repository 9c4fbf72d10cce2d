//! 檔案存檔：每個鍵一個 JSON 檔
//!
//! 寫入先落到同目錄的暫存檔再改名，避免寫到一半留下壞檔。
//! 任何 IO 失敗記 `tracing::warn!` 後吞掉；載入端的清洗層
//! 本來就假設內容可能是任何東西。

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use super::hooks::Storage;

/// 落地到目錄的存檔實作
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Err(err) = fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), %err, "failed to create save directory");
        }
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(payload) => Some(payload),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!(path = %path.display(), %err, "failed to read save file");
                None
            }
        }
    }

    fn store(&mut self, key: &str, payload: &str) {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        if let Err(err) = fs::write(&tmp, payload) {
            warn!(path = %tmp.display(), %err, "failed to write save file");
            return;
        }
        if let Err(err) = fs::rename(&tmp, &path) {
            warn!(path = %path.display(), %err, "failed to replace save file");
        }
    }

    fn remove(&mut self, key: &str) {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), %err, "failed to remove save file"),
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());

        assert!(storage.load("run").is_none());
        storage.store("run", r#"{"version":1}"#);
        assert_eq!(storage.load("run").as_deref(), Some(r#"{"version":1}"#));

        // 暫存檔不殘留
        assert!(!dir.path().join("run.json.tmp").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());

        storage.store("profile", "{}");
        storage.remove("profile");
        storage.remove("profile");
        assert!(storage.load("profile").is_none());
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path());

        storage.store("run", "old");
        storage.store("run", "new");
        assert_eq!(storage.load("run").as_deref(), Some("new"));
    }
}
