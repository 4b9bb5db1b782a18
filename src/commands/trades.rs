use crate::commands::ApiResponse;
use crate::models::{Trade, TradeSummary};
use crate::Journal;

/// Create or update a trade, returning its id.
pub async fn save_trade(journal: &Journal, trade: Trade) -> ApiResponse<String> {
    ApiResponse::from_result(journal.save_trade(&trade).await)
}

pub async fn get_trade(journal: &Journal, id: &str) -> ApiResponse<Trade> {
    ApiResponse::from_result(journal.trades().load(id).await)
}

/// Summaries of every valid trade on disk, newest first.
pub async fn list_trades(journal: &Journal) -> ApiResponse<Vec<TradeSummary>> {
    ApiResponse::from_result(journal.trades().list().await)
}

pub async fn delete_trade(journal: &Journal, id: &str) -> ApiResponse<()> {
    ApiResponse::from_result(journal.delete_trade(id).await)
}

pub async fn duplicate_trade(journal: &Journal, id: &str) -> ApiResponse<Trade> {
    ApiResponse::from_result(journal.duplicate_trade(id).await)
}
