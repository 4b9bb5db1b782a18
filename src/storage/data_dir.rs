use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::locator::{DirectoryLocator, Locator};
use crate::error::{StoreError, StoreResult};

pub const TRADES_DIR: &str = "trades";
pub const THESES_DIR: &str = "theses";
pub const SCREENSHOTS_DIR: &str = "screenshots";
pub const BACKUPS_DIR: &str = "backups";
pub const SETTINGS_FILE: &str = "settings.json";

/// Directories replaced wholesale by a restore.
const RESTORED_DIRS: &[&str] = &[TRADES_DIR, THESES_DIR, SCREENSHOTS_DIR];

/// On-disk layout of a journal rooted at `data/`.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn trades_dir(&self) -> PathBuf {
        self.root.join(TRADES_DIR)
    }

    pub fn theses_dir(&self) -> PathBuf {
        self.root.join(THESES_DIR)
    }

    pub fn screenshots_dir(&self) -> PathBuf {
        self.root.join(SCREENSHOTS_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE)
    }

    /// Create every directory of the layout.
    pub async fn ensure(&self) -> StoreResult<()> {
        for dir in [
            self.trades_dir(),
            self.theses_dir(),
            self.screenshots_dir(),
            self.backups_dir(),
        ] {
            fs::create_dir_all(&dir).await?;
        }
        log::info!("Journal data directory ready at {:?}", self.root);
        Ok(())
    }

    /// Every entity file a backup must include: all trades, all theses and
    /// the settings document.
    pub async fn entity_files(&self) -> StoreResult<Vec<PathBuf>> {
        let mut files = DirectoryLocator::recursive(self.trades_dir()).entries().await?;
        files.extend(DirectoryLocator::flat(self.theses_dir()).entries().await?);

        let settings = self.settings_path();
        if fs::try_exists(&settings).await? {
            files.push(settings);
        }
        Ok(files)
    }

    /// Replace the entity directories and settings with those of `source`,
    /// an unpacked backup. Entries missing from `source` end up empty.
    ///
    /// `source` may live under `backups/` but must not be the root, one of
    /// its ancestors, or inside a directory the restore replaces.
    pub async fn restore_from(&self, source: &Path) -> StoreResult<()> {
        if !fs::metadata(source).await?.is_dir() {
            return Err(invalid_source(source, "is not a directory"));
        }
        self.ensure_disjoint(source).await?;

        for name in RESTORED_DIRS {
            let target = self.root.join(name);
            if fs::try_exists(&target).await? {
                fs::remove_dir_all(&target).await?;
            }

            let from = source.join(name);
            if fs::try_exists(&from).await? {
                copy_dir(&from, &target).await?;
            } else {
                fs::create_dir_all(&target).await?;
            }
        }

        let settings = self.settings_path();
        if fs::try_exists(&settings).await? {
            fs::remove_file(&settings).await?;
        }
        let source_settings = source.join(SETTINGS_FILE);
        if fs::try_exists(&source_settings).await? {
            fs::copy(&source_settings, &settings).await?;
        }

        log::info!("Restored journal data from {:?}", source);
        Ok(())
    }

    async fn ensure_disjoint(&self, source: &Path) -> StoreResult<()> {
        let source = fs::canonicalize(source).await?;
        let root = match fs::canonicalize(&self.root).await {
            Ok(root) => root,
            // Nothing on disk yet, so nothing to overwrite
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let overlaps = root.starts_with(&source)
            || RESTORED_DIRS
                .iter()
                .any(|name| source.starts_with(root.join(name)));
        if overlaps {
            log::warn!("Refusing restore from {:?} into {:?}", source, root);
            return Err(invalid_source(&source, "overlaps the journal data directory"));
        }
        Ok(())
    }
}

fn invalid_source(source: &Path, reason: &str) -> StoreError {
    StoreError::UnknownIo(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("restore source {source:?} {reason}"),
    ))
}

async fn copy_dir(from: &Path, to: &Path) -> io::Result<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];

    while let Some((src, dst)) = pending.pop() {
        fs::create_dir_all(&dst).await?;
        let mut reader = fs::read_dir(&src).await?;
        while let Some(entry) = reader.next_entry().await? {
            let target = dst.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                fs::copy(entry.path(), target).await?;
            }
        }
    }
    Ok(())
}
