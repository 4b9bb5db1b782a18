use std::path::{Path, PathBuf};

use crate::commands::ApiResponse;
use crate::models::BackupData;
use crate::Journal;

/// Files the backup collaborator must archive.
pub async fn list_entity_files(journal: &Journal) -> ApiResponse<Vec<PathBuf>> {
    ApiResponse::from_result(journal.entity_files().await)
}

pub async fn export_snapshot(journal: &Journal) -> ApiResponse<BackupData> {
    ApiResponse::from_result(journal.export_snapshot().await)
}

/// Replace all journal data with the contents of an unpacked backup.
pub async fn restore_backup(journal: &Journal, source: &Path) -> ApiResponse<()> {
    ApiResponse::from_result(journal.restore_backup(source).await)
}
