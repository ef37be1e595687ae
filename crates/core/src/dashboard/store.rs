use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKey {
    Watchlist,
    Alerts,
    Portfolio,
}

impl ListKey {
    fn file_name(self) -> &'static str {
        match self {
            Self::Watchlist => "watchlist.json",
            Self::Alerts => "alerts.json",
            Self::Portfolio => "portfolio.json",
        }
    }
}

/// Three independently keyed JSON lists in one directory. Each list is rewritten whole on
/// every change.
#[derive(Debug, Clone)]
pub struct ListStore {
    dir: PathBuf,
}

impl ListStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: ListKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// A missing file reads as an empty list.
    pub fn load<T: DeserializeOwned>(&self, key: ListKey) -> anyhow::Result<Vec<T>> {
        let path = self.path(key);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid JSON list", path.display()))
    }

    pub fn save<T: Serialize>(&self, key: ListKey, items: &[T]) -> anyhow::Result<()> {
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(items).context("failed to serialize list")?;
        std::fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}
