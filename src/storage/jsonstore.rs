//! Generic JSON-file-backed store.
//!
//! Small mutable state (user preferences, translation cache) lives in pretty
//! printed JSON files so operators can inspect and hand-edit them. Writes go
//! through a temp file followed by a rename so a crash mid-write never
//! leaves a truncated store behind.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::core::error::AppResult;

pub struct JsonStore<T> {
    path: PathBuf,
    data: Mutex<T>,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Loads the store from `path`, starting from `T::default()` when the
    /// file does not exist yet. A file that exists but fails to parse is an
    /// error: silently resetting it would wipe user data.
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let data = match fs_err::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => T::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs a read-only closure against the current state
    pub async fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.data.lock().await;
        f(&guard)
    }

    /// Mutates the state and persists it to disk before returning
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> AppResult<R> {
        let mut guard = self.data.lock().await;
        let result = f(&mut guard);
        let json = serde_json::to_string_pretty(&*guard)?;

        if let Some(parent) = self.path.parent() {
            fs_err::tokio::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs_err::tokio::write(&tmp, json.as_bytes()).await?;
        fs_err::tokio::rename(&tmp, &self.path).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    type Counters = HashMap<String, u32>;

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let store: JsonStore<Counters> = JsonStore::load(dir.path().join("counters.json")).unwrap();
        let len = store.read(|c| c.len()).await;
        assert_eq!(len, 0);
    }

    #[tokio::test]
    async fn test_update_persists_across_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.json");

        let store: JsonStore<Counters> = JsonStore::load(&path).unwrap();
        store
            .update(|c| {
                c.insert("hits".to_string(), 3);
            })
            .await
            .unwrap();
        drop(store);

        let reloaded: JsonStore<Counters> = JsonStore::load(&path).unwrap();
        let hits = reloaded.read(|c| c.get("hits").copied()).await;
        assert_eq!(hits, Some(3));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs_err::write(&path, b"{ not json").unwrap();

        let result: AppResult<JsonStore<Counters>> = JsonStore::load(&path);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.json");
        let store: JsonStore<Counters> = JsonStore::load(&path).unwrap();
        store
            .update(|c| {
                c.insert("k".to_string(), 1);
            })
            .await
            .unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }
}
