use crate::commands::ApiResponse;
use crate::models::{Quarter, Thesis, ThesisSummary};
use crate::Journal;

/// Create a thesis or record a new version of an existing one.
pub async fn save_thesis(journal: &Journal, thesis: Thesis) -> ApiResponse<String> {
    ApiResponse::from_result(journal.theses().save(&thesis).await)
}

pub async fn get_thesis(journal: &Journal, id: &str) -> ApiResponse<Thesis> {
    ApiResponse::from_result(journal.theses().load(id).await)
}

pub async fn list_theses(journal: &Journal) -> ApiResponse<Vec<ThesisSummary>> {
    ApiResponse::from_result(journal.theses().list().await)
}

/// Linked trades are left pointing at the deleted id.
pub async fn delete_thesis(journal: &Journal, id: &str) -> ApiResponse<()> {
    ApiResponse::from_result(journal.theses().delete(id).await)
}

/// `data` is absent when the quarter has no active thesis.
pub async fn get_active_thesis(
    journal: &Journal,
    year: i32,
    quarter: Quarter,
) -> ApiResponse<Option<Thesis>> {
    ApiResponse::from_result(journal.theses().get_active(year, quarter).await)
}

pub async fn set_thesis_active(journal: &Journal, id: &str, active: bool) -> ApiResponse<Thesis> {
    ApiResponse::from_result(journal.theses().set_active(id, active).await)
}
