//! Default port implementations.

use crate::ports::{DocumentStore, WritePort};
use anyhow::{anyhow, Context};
use camino::{Utf8Path, Utf8PathBuf};
use docufill_tree::DocTree;
use fs_err as fs;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::debug;

/// In-memory document store for embedding and testing.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: Mutex<BTreeMap<String, DocTree>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, tree: DocTree) -> Self {
        if let Ok(mut docs) = self.docs.lock() {
            docs.insert(key.into(), tree);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<DocTree> {
        self.docs.lock().ok()?.get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.docs
            .lock()
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn open(&self, key: &str) -> anyhow::Result<DocTree> {
        let docs = self
            .docs
            .lock()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        docs.get(key)
            .cloned()
            .ok_or_else(|| anyhow!("no document named {key}"))
    }

    fn persist(&self, key: &str, tree: &DocTree) -> anyhow::Result<()> {
        let mut docs = self
            .docs
            .lock()
            .map_err(|_| anyhow!("document store lock poisoned"))?;
        docs.insert(key.to_string(), tree.clone());
        Ok(())
    }
}

/// JSON snapshots on disk. Keys are paths relative to `root` (absolute keys are used as-is).
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    pub root: Utf8PathBuf,
}

impl JsonDocumentStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> Utf8PathBuf {
        let key = Utf8Path::new(key);
        if key.is_absolute() {
            key.to_path_buf()
        } else {
            self.root.join(key)
        }
    }
}

impl DocumentStore for JsonDocumentStore {
    fn open(&self, key: &str) -> anyhow::Result<DocTree> {
        let path = self.path_for(key);
        let text = fs::read_to_string(&path).with_context(|| format!("read {path}"))?;
        let tree: DocTree =
            serde_json::from_str(&text).with_context(|| format!("parse document {path}"))?;
        debug!(%path, "opened document");
        Ok(tree)
    }

    fn persist(&self, key: &str, tree: &DocTree) -> anyhow::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create parent dir for {path}"))?;
        }
        let json = serde_json::to_string_pretty(tree).context("serialize document")?;
        fs::write(&path, json).with_context(|| format!("write {path}"))?;
        debug!(%path, "persisted document");
        Ok(())
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create parent dir for {path}"))?;
        }
        fs::write(path, contents).with_context(|| format!("write {path}"))
    }

    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create_dir_all {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> DocTree {
        let mut tree = DocTree::new();
        tree.add_text_paragraph(tree.body(), "hello").unwrap();
        tree
    }

    fn utf8_root(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    #[test]
    fn in_memory_store_round_trips() {
        let store = InMemoryDocumentStore::new().with("a", sample());
        let tree = store.open("a").unwrap();
        store.persist("b", &tree).unwrap();
        assert_eq!(store.get("b"), Some(sample()));
        assert_eq!(store.keys(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn in_memory_store_reports_missing_keys() {
        let store = InMemoryDocumentStore::new();
        let err = store.open("nope").unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn json_store_writes_nested_paths() {
        let dir = TempDir::new().unwrap();
        let store = JsonDocumentStore::new(utf8_root(&dir));
        store.persist("out/nested/doc.json", &sample()).unwrap();

        assert!(dir.path().join("out/nested/doc.json").exists());
        assert_eq!(store.open("out/nested/doc.json").unwrap(), sample());
    }

    #[test]
    fn json_store_reports_parse_errors_with_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let store = JsonDocumentStore::new(utf8_root(&dir));

        let err = store.open("bad.json").unwrap_err();
        assert!(format!("{err:#}").contains("bad.json"));
    }

    #[test]
    fn fs_write_port_creates_parents() {
        let dir = TempDir::new().unwrap();
        let root = utf8_root(&dir);
        let path = root.join("a/b/summary.md");
        FsWritePort.write_file(&path, b"# hi\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }
}
