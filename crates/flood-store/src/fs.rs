//! One JSON file per key in a directory

use flood_core::{KvStore, StoreResult};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Everything outside `[a-z0-9_-]` is escaped so names survive
/// case-insensitive filesystems
const KEY_ESCAPES: &AsciiSet = &uppercase_escapes(NON_ALPHANUMERIC.remove(b'_').remove(b'-'));

const fn uppercase_escapes(set: AsciiSet) -> AsciiSet {
    let mut set = set;
    let mut c = b'A';
    while c <= b'Z' {
        set = set.add(c);
        c += 1;
    }
    set
}

pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }

    async fn blocking<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> std::io::Result<T> + Send + 'static,
    {
        let dir = self.dir.clone();
        let result = tokio::task::spawn_blocking(move || op(dir))
            .await
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
        Ok(result?)
    }
}

fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ESCAPES).to_string()
}

fn decode_key(name: &str) -> Option<String> {
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|key| key.into_owned())
}

#[async_trait::async_trait]
impl KvStore for FsStore {
    async fn get(&self, key: &str) -> StoreResult<Option<Value>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Each write goes to its own temp file, renamed over the target
    async fn set(&self, key: &str, value: Value) -> StoreResult<()> {
        let path = self.path_for(key);
        let bytes = serde_json::to_vec(&value)?;
        self.blocking(move |dir| {
            let mut tmp = NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&path)?;
            Ok(())
        })
        .await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The file is renamed onto a private temp path first; only one
    /// caller can win that rename.
    async fn take(&self, key: &str) -> StoreResult<Option<Value>> {
        let path = self.path_for(key);
        let bytes = self
            .blocking(move |dir| {
                let claim = tempfile::Builder::new().prefix(".take").tempfile_in(dir)?;
                match std::fs::rename(&path, claim.path()) {
                    Ok(()) => std::fs::read(claim.path()).map(Some),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await?;
        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            match decode_key(stem) {
                Some(key) if key.starts_with(prefix) => keys.push(key),
                Some(_) => {}
                None => tracing::warn!(file = %stem, "skipping undecodable store file"),
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_key_encoding() {
        assert_eq!(encode_key("station_gent"), "station_gent");
        assert_eq!(encode_key("station_Sint Niklaas"), "station_%53int%20%4Eiklaas");
        assert_eq!(
            decode_key(&encode_key("history_a/b é")).as_deref(),
            Some("history_a/b é")
        );
        assert_eq!(decode_key("bad%FF"), None);
    }

    #[tokio::test]
    async fn test_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path()).unwrap();

        store
            .set("station_gent", json!({"distance": 42.0}))
            .await
            .unwrap();
        store.set("history_gent", json!([])).await.unwrap();

        let value = store.get("station_gent").await.unwrap().unwrap();
        assert_eq!(value["distance"], 42.0);
        assert!(dir.path().join("station_gent.json").exists());

        assert_eq!(store.list("station_").await.unwrap(), vec!["station_gent"]);

        store.delete("station_gent").await.unwrap();
        store.delete("station_gent").await.unwrap();
        assert!(store.get("station_gent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reopen_sees_previous_writes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = FsStore::new(dir.path()).unwrap();
            store.set("weather_doornik", json!({"tier": "stormy"})).await.unwrap();
        }
        let store = FsStore::new(dir.path()).unwrap();
        let value = store.get("weather_doornik").await.unwrap().unwrap();
        assert_eq!(value["tier"], "stormy");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()).unwrap());
        let payload: Vec<f64> = (0..2000).map(f64::from).collect();

        for round in 0..20 {
            let writers: Vec<_> = (0..8)
                .map(|writer| {
                    let store = Arc::clone(&store);
                    let doc = json!({"round": round, "writer": writer, "vals": payload});
                    tokio::spawn(async move { store.set("history_gent", doc).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let value = store.get("history_gent").await.unwrap().unwrap();
            assert_eq!(value["round"], round);
            assert_eq!(value["vals"].as_array().unwrap().len(), 2000);
        }

        // No temp files left behind
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_take_has_a_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FsStore::new(dir.path()).unwrap());

        for _ in 0..50 {
            store
                .set("pending_notify_gent", json!({"message": "hi"}))
                .await
                .unwrap();
            let readers: Vec<_> = (0..2)
                .map(|_| {
                    let store = Arc::clone(&store);
                    tokio::spawn(async move { store.take("pending_notify_gent").await })
                })
                .collect();
            let mut delivered = 0;
            for reader in readers {
                if reader.await.unwrap().unwrap().is_some() {
                    delivered += 1;
                }
            }
            assert_eq!(delivered, 1);
            assert!(store.get("pending_notify_gent").await.unwrap().is_none());
        }
    }
}
