use crate::commands::ApiResponse;
use crate::models::Trade;
use crate::Journal;

/// Attach a base64 image (data URLs accepted) and return the updated trade.
pub async fn add_screenshot(
    journal: &Journal,
    trade_id: &str,
    file_name: &str,
    data: &str,
    caption: Option<String>,
) -> ApiResponse<Trade> {
    ApiResponse::from_result(journal.add_screenshot(trade_id, file_name, data, caption).await)
}

pub async fn remove_screenshot(journal: &Journal, trade_id: &str, screenshot_id: &str) -> ApiResponse<Trade> {
    ApiResponse::from_result(journal.remove_screenshot(trade_id, screenshot_id).await)
}
