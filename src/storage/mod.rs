pub mod data_dir;
pub mod locator;
pub mod screenshot_store;
pub mod settings_store;
pub mod thesis_store;
pub mod trade_store;
pub mod validator;

pub use data_dir::DataDir;
pub use locator::{DirectoryLocator, Locator};
pub use screenshot_store::ScreenshotStore;
pub use settings_store::SettingsStore;
pub use thesis_store::ThesisStore;
pub use trade_store::TradeStore;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

use crate::error::{StoreError, StoreResult};
use validator::ValidationError;

const MAX_SLUG_LEN: usize = 40;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("static regex"))
}

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9]+").expect("static regex"))
}

/// Ids become filename components, so they may not contain `_` or separators.
pub fn is_valid_id(id: &str) -> bool {
    id_pattern().is_match(id)
}

pub fn ensure_valid_id(id: &str) -> StoreResult<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

/// Reduce free text to a filename-safe prefix component.
pub fn slugify(text: &str) -> String {
    let slug = slug_pattern().replace_all(text.trim(), "-");
    let slug: String = slug.trim_matches('-').chars().take(MAX_SLUG_LEN).collect();
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Read, parse and validate one entity file. Each stage fails with its own
/// error kind.
pub(crate) async fn read_entity<T>(
    path: &Path,
    validate: fn(Value) -> Result<T, ValidationError>,
) -> StoreResult<T> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| StoreError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let raw: Value = serde_json::from_str(&content).map_err(|source| StoreError::CorruptData {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(validate(raw)?)
}

/// Pretty-printed full-document write; the parent directory is created on demand.
pub(crate) async fn write_entity<T: Serialize>(path: &Path, entity: &T) -> StoreResult<()> {
    let data = serde_json::to_string_pretty(entity)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    fs::write(path, data).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(is_valid_id("TRADE-1704067200000-3f2a"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../etc/passwd"));
        assert!(!is_valid_id("has_underscore"));
        assert!(!is_valid_id("a/b"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("BRK.B"), "BRK-B");
        assert_eq!(slugify("  Rate cuts & tech  "), "Rate-cuts-tech");
        assert_eq!(slugify("___"), "untitled");
        assert_eq!(slugify(&"x".repeat(80)).len(), MAX_SLUG_LEN);
    }
}
