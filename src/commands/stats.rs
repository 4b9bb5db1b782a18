use crate::analytics::{EquityCurvePoint, PerformanceMetrics, PortfolioMetrics};
use crate::commands::ApiResponse;
use crate::Journal;

pub async fn get_metrics(journal: &Journal) -> ApiResponse<PerformanceMetrics> {
    ApiResponse::from_result(journal.metrics().await)
}

pub async fn get_thesis_metrics(journal: &Journal, thesis_id: &str) -> ApiResponse<PerformanceMetrics> {
    ApiResponse::from_result(journal.thesis_metrics(thesis_id).await)
}

pub async fn get_portfolio_metrics(journal: &Journal) -> ApiResponse<PortfolioMetrics> {
    ApiResponse::from_result(journal.portfolio_metrics().await)
}

pub async fn get_equity_curve(journal: &Journal) -> ApiResponse<Vec<EquityCurvePoint>> {
    ApiResponse::from_result(journal.equity_curve().await)
}
