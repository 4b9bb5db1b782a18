use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use super::ensure_valid_id;
use super::validator::ValidationError;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::models::Screenshot;

const DEFAULT_EXTENSION: &str = "png";
const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Image assets referenced by trades, stored flat under `screenshots/`.
pub struct ScreenshotStore {
    root: PathBuf,
}

impl ScreenshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Decode and store an image for `trade_id`, returning the reference to
    /// embed in the trade document.
    pub async fn store(
        &self,
        trade_id: &str,
        file_name: &str,
        base64_data: &str,
        caption: Option<String>,
    ) -> StoreResult<Screenshot> {
        ensure_valid_id(trade_id)?;

        // Accept data URLs as produced by browser file readers
        let payload = match base64_data.split_once(";base64,") {
            Some((_, data)) => data,
            None => base64_data,
        };
        let bytes = BASE64.decode(payload.trim()).map_err(|_| {
            StoreError::InvalidEntity(ValidationError::WrongType {
                field: "data".to_string(),
                expected: "base64-encoded image data",
            })
        })?;

        let id = Uuid::new_v4().to_string();
        let stored_name = format!("{}_{}.{}", trade_id, id, extension_of(file_name));

        fs::create_dir_all(&self.root).await?;
        fs::write(self.root.join(&stored_name), &bytes).await?;
        log::debug!("Stored screenshot {} ({} bytes) for trade {}", stored_name, bytes.len(), trade_id);

        Ok(Screenshot {
            id,
            file_name: file_name.to_string(),
            path: stored_name,
            caption,
            added_at: Utc::now(),
        })
    }

    pub async fn read(&self, screenshot: &Screenshot) -> StoreResult<Vec<u8>> {
        let path = self.resolve(screenshot)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(StoreError::not_found(EntityKind::Screenshot, &screenshot.id))
            }
            Err(source) => Err(StoreError::Unreadable { path, source }),
        }
    }

    pub async fn remove(&self, screenshot: &Screenshot) -> StoreResult<()> {
        let path = self.resolve(screenshot)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(StoreError::not_found(EntityKind::Screenshot, &screenshot.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Stored paths are bare file names; anything else would escape `root`.
    fn resolve(&self, screenshot: &Screenshot) -> StoreResult<PathBuf> {
        let name = Path::new(&screenshot.path);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(StoreError::InvalidId(screenshot.path.clone()));
        }
        Ok(self.root.join(name))
    }
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .filter(|e| ALLOWED_EXTENSIONS.iter().any(|allowed| allowed == e))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_store_read_remove() {
        let dir = TempDir::new().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let encoded = BASE64.encode(b"\x89PNG fake image");

        let shot = store
            .store("TRADE-1", "Chart.PNG", &encoded, Some("entry".to_string()))
            .await
            .unwrap();
        assert!(shot.path.starts_with("TRADE-1_"));
        assert!(shot.path.ends_with(".png"));
        assert_eq!(store.read(&shot).await.unwrap(), b"\x89PNG fake image");

        store.remove(&shot).await.unwrap();
        assert!(matches!(store.read(&shot).await, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_data_url_prefix_is_accepted() {
        let dir = TempDir::new().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let data = format!("data:image/jpeg;base64,{}", BASE64.encode(b"jpeg"));

        let shot = store.store("TRADE-1", "a.jpg", &data, None).await.unwrap();
        assert_eq!(store.read(&shot).await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_invalid_base64() {
        let dir = TempDir::new().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let err = store.store("TRADE-1", "a.png", "%%%", None).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidEntity(_)));
    }

    #[tokio::test]
    async fn test_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let store = ScreenshotStore::new(dir.path());
        let shot = Screenshot {
            id: "x".to_string(),
            file_name: "x.png".to_string(),
            path: "../secret.png".to_string(),
            caption: None,
            added_at: Utc::now(),
        };
        assert!(matches!(store.read(&shot).await, Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(extension_of("shot.JPG"), "jpg");
        assert_eq!(extension_of("shot.exe"), "png");
        assert_eq!(extension_of("noext"), "png");
    }
}
