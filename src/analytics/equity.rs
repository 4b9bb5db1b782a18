use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityCurvePoint {
    pub date: String,
    pub cumulative_pnl: f64,
    pub daily_pnl: f64,
    pub trade_count: usize,
}

/// Daily cumulative realized P&L of completed trades, oldest day first.
pub fn equity_curve<'a, I>(trades: I) -> Vec<EquityCurvePoint>
where
    I: IntoIterator<Item = &'a Trade>,
{
    // Group by exit day (YYYY-MM-DD sorts chronologically)
    let mut daily: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for trade in trades.into_iter().filter(|t| t.is_completed()) {
        let (Some(exit_date), Some(pnl)) = (trade.exit_date, trade.realized_pnl()) else {
            continue;
        };
        let entry = daily
            .entry(exit_date.format("%Y-%m-%d").to_string())
            .or_insert((0.0, 0));
        entry.0 += pnl;
        entry.1 += 1;
    }

    let mut cumulative_pnl = 0.0;
    daily
        .into_iter()
        .map(|(date, (daily_pnl, trade_count))| {
            cumulative_pnl += daily_pnl;
            EquityCurvePoint {
                date,
                cumulative_pnl,
                daily_pnl,
                trade_count,
            }
        })
        .collect()
}

/// Largest peak-to-trough fall of the running P&L total, starting from zero.
pub fn max_drawdown<I>(pnls: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let mut equity = 0.0_f64;
    let mut peak = 0.0_f64;
    let mut worst = 0.0_f64;

    for pnl in pnls {
        equity += pnl;
        peak = peak.max(equity);
        worst = worst.max(peak - equity);
    }
    worst
}
