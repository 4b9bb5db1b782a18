pub mod equity;
pub mod metrics;

pub use equity::{equity_curve, max_drawdown, EquityCurvePoint};
pub use metrics::{
    compute_metrics, portfolio_metrics, PerformanceMetrics, PortfolioMetrics, ProfitFactor,
    ThesisPerformance,
};
