use crate::commands::ApiResponse;
use crate::models::{Settings, UpdateSettingsInput};
use crate::Journal;

pub async fn get_settings(journal: &Journal) -> ApiResponse<Settings> {
    ApiResponse::from_result(journal.settings().await)
}

pub async fn update_settings(journal: &Journal, settings: UpdateSettingsInput) -> ApiResponse<Settings> {
    ApiResponse::from_result(journal.update_settings(settings).await)
}
