use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tokio::fs;

use super::write_entity;
use crate::error::{StoreError, StoreResult};
use crate::models::{Settings, UpdateSettingsInput};

/// Single `settings.json` document; absent means defaults.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> StoreResult<Settings> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == IoErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(StoreError::Unreadable {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| StoreError::CorruptData {
            path: self.path.clone(),
            source,
        })
    }

    pub async fn save(&self, settings: &Settings) -> StoreResult<()> {
        write_entity(&self.path, settings).await
    }

    pub async fn update(&self, input: UpdateSettingsInput) -> StoreResult<Settings> {
        let mut settings = self.load().await?;
        settings.apply(input);
        self.save(&settings).await?;
        Ok(settings)
    }
}
