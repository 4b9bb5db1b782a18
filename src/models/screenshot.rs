use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an image stored under `data/screenshots/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub id: String,
    pub file_name: String,
    /// Path relative to the screenshots directory.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub added_at: DateTime<Utc>,
}
