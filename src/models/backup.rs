use serde::{Deserialize, Serialize};

use super::{Settings, Thesis, Trade};

/// Whole-journal export handed to the backup collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub settings: Settings,
    pub trades: Vec<Trade>,
    pub theses: Vec<Thesis>,
    pub export_date: String,
    pub version: String,
}
