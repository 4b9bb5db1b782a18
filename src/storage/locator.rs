use async_trait::async_trait;
use std::fs::FileType;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::ensure_valid_id;
use crate::error::StoreResult;

/// Resolves entity ids to backing files.
///
/// Stores only talk to this trait, so the directory scan below can be
/// replaced by a real key-value index without touching their call sites.
#[async_trait]
pub trait Locator: Send + Sync {
    /// Directory new documents are written under.
    fn root(&self) -> &Path;

    /// First file whose name ends in `_<id>.json`, or `None`.
    async fn locate(&self, id: &str) -> StoreResult<Option<PathBuf>>;

    /// Every candidate entity file, in a stable order. Entries that can't
    /// be read are logged and skipped.
    async fn entries(&self) -> StoreResult<Vec<PathBuf>>;
}

/// Filename-as-index locator: scans `root` (and its subdirectories when
/// `recursive`) on every call.
#[derive(Debug, Clone)]
pub struct DirectoryLocator {
    root: PathBuf,
    recursive: bool,
}

impl DirectoryLocator {
    pub fn new(root: impl Into<PathBuf>, recursive: bool) -> Self {
        Self {
            root: root.into(),
            recursive,
        }
    }

    /// Year-partitioned trade layout.
    pub fn recursive(root: impl Into<PathBuf>) -> Self {
        Self::new(root, true)
    }

    /// Flat thesis layout.
    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self::new(root, false)
    }
}

/// Id encoded in a `<prefix>_<id>.json` filename.
pub fn id_from_path(path: &Path) -> Option<&str> {
    if path.extension()? != "json" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (_, id) = stem.rsplit_once('_')?;
    if id.is_empty() { None } else { Some(id) }
}

#[async_trait]
impl Locator for DirectoryLocator {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn locate(&self, id: &str) -> StoreResult<Option<PathBuf>> {
        ensure_valid_id(id)?;

        let found = self
            .entries()
            .await?
            .into_iter()
            .find(|path| id_from_path(path) == Some(id));

        Ok(found)
    }

    async fn entries(&self) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut reader = match fs::read_dir(&dir).await {
                Ok(reader) => reader,
                // A missing root is an empty collection
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) if dir == self.root => return Err(e.into()),
                Err(e) => {
                    log::warn!("Skipping unreadable directory {:?}: {}", dir, e);
                    continue;
                }
            };

            loop {
                let entry = match reader.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        log::warn!("Stopped listing {:?} early: {}", dir, e);
                        break;
                    }
                };

                match classify(entry.path(), entry.file_type().await) {
                    Entry::Dir(path) if self.recursive => pending.push(path),
                    Entry::Document(path) => files.push(path),
                    Entry::Dir(_) | Entry::Ignored => {}
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

#[derive(Debug, PartialEq)]
enum Entry {
    Dir(PathBuf),
    Document(PathBuf),
    Ignored,
}

/// Sort one directory entry. Entries whose type can't be read are skipped.
fn classify(path: PathBuf, file_type: io::Result<FileType>) -> Entry {
    let file_type = match file_type {
        Ok(file_type) => file_type,
        Err(e) => {
            log::warn!("Skipping {:?}: {}", path, e);
            return Entry::Ignored;
        }
    };

    if file_type.is_dir() {
        return Entry::Dir(path);
    }

    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    if file_type.is_file() && !hidden && path.extension().is_some_and(|e| e == "json") {
        Entry::Document(path)
    } else {
        Entry::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use tempfile::TempDir;

    async fn touch(path: PathBuf) {
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, "{}").await.unwrap();
    }

    #[test]
    fn test_id_from_path() {
        assert_eq!(
            id_from_path(Path::new("/d/AAPL_2024-03-01_TRADE-1-abc.json")),
            Some("TRADE-1-abc")
        );
        assert_eq!(id_from_path(Path::new("/d/noprefix.json")), None);
        assert_eq!(id_from_path(Path::new("/d/AAPL_x.txt")), None);
    }

    #[tokio::test]
    async fn test_recursive_locate_across_partitions() {
        let dir = TempDir::new().unwrap();
        touch(dir.path().join("2023/AAPL_2023-12-29_T-1.json")).await;
        touch(dir.path().join("2024/MSFT_2024-01-02_T-2.json")).await;
        touch(dir.path().join("2024/notes.txt")).await;

        let locator = DirectoryLocator::recursive(dir.path());
        assert_eq!(locator.entries().await.unwrap().len(), 2);

        let found = locator.locate("T-2").await.unwrap().unwrap();
        assert!(found.ends_with("2024/MSFT_2024-01-02_T-2.json"));
        assert!(locator.locate("T-3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_flat_locator_ignores_subdirectories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path().join("nested/Plan_2024-Q1_X-1.json")).await;

        let locator = DirectoryLocator::flat(dir.path());
        assert!(locator.locate("X-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_suffix_match_is_exact() {
        let dir = TempDir::new().unwrap();
        touch(dir.path().join("AAPL_2024-01-02_AB-1.json")).await;

        let locator = DirectoryLocator::flat(dir.path());
        assert!(locator.locate("B-1").await.unwrap().is_none());
        assert!(locator.locate("AB-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unreadable_entry_is_skipped() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("AAPL_2024-01-02_T-1.json");
        touch(doc.clone()).await;
        let file_type = fs::metadata(&doc).await.unwrap().file_type();

        assert_eq!(classify(doc.clone(), Ok(file_type)), Entry::Document(doc.clone()));
        assert_eq!(
            classify(doc, Err(io::Error::from(ErrorKind::PermissionDenied))),
            Entry::Ignored
        );
        assert_eq!(
            classify(dir.path().join(".hidden.json"), Ok(file_type)),
            Entry::Ignored
        );
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let locator = DirectoryLocator::recursive(dir.path().join("absent"));
        assert!(locator.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_unsafe_id() {
        let dir = TempDir::new().unwrap();
        let locator = DirectoryLocator::flat(dir.path());
        let result = locator.locate("../x").await;
        assert!(matches!(result, Err(StoreError::InvalidId(_))));
    }
}
