use crate::storage::KvStore;
use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// One file per key under a directory. Writes go to a temp file and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create store dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", encode_key(key)))
    }
}

// Keeps [A-Za-z0-9_-] and percent-encodes every other byte, so distinct keys map to
// distinct file names.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[async_trait::async_trait]
impl KvStore for FileStore {
    fn backend_name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => Ok(Some(s)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to move {} into place", path.display()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("failed to remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_keys_to_distinct_file_names() {
        assert_eq!(encode_key("financial_MSFT"), "financial_MSFT");
        assert_eq!(encode_key("financial_BRK.B"), "financial_BRK%2EB");
        assert_eq!(encode_key("a/b"), "a%2Fb");
        assert_ne!(encode_key("a.b"), encode_key("a_b"));
    }

    #[tokio::test]
    async fn round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).await.unwrap();

        assert_eq!(store.get("dealPipeline").await.unwrap(), None);
        store.set("dealPipeline", "[]").await.unwrap();
        store.set("dealPipeline", "[1]").await.unwrap();
        assert_eq!(store.get("dealPipeline").await.unwrap().as_deref(), Some("[1]"));

        store.remove("dealPipeline").await.unwrap();
        store.remove("dealPipeline").await.unwrap();
        assert_eq!(store.get("dealPipeline").await.unwrap(), None);
    }
}
