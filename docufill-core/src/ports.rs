//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use docufill_tree::DocTree;

/// Opens and persists documents by key.
///
/// Batch workers share one store, so implementations must tolerate concurrent calls for
/// different keys.
pub trait DocumentStore {
    fn open(&self, key: &str) -> anyhow::Result<DocTree>;
    fn persist(&self, key: &str, tree: &DocTree) -> anyhow::Result<()>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
    fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
