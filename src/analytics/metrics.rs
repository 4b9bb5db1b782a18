use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::equity::max_drawdown;
use crate::models::{Thesis, Trade, TradeOutcome, TradeStatus};

/// Total profit over total loss. `Unbounded` when there are profits but no
/// losses; never NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    Finite(f64),
    Unbounded,
}

impl ProfitFactor {
    pub fn from_totals(total_profit: f64, total_loss: f64) -> Self {
        if total_loss > 0.0 {
            ProfitFactor::Finite(total_profit / total_loss)
        } else if total_profit > 0.0 {
            ProfitFactor::Unbounded
        } else {
            ProfitFactor::Finite(0.0)
        }
    }

    pub fn as_finite(&self) -> Option<f64> {
        match self {
            ProfitFactor::Finite(v) => Some(*v),
            ProfitFactor::Unbounded => None,
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(0.0)
    }
}

const UNBOUNDED_TAG: &str = "unbounded";

impl Serialize for ProfitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Finite(v) => serializer.serialize_f64(*v),
            ProfitFactor::Unbounded => serializer.serialize_str(UNBOUNDED_TAG),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProfitFactorVisitor;

        impl Visitor<'_> for ProfitFactorVisitor {
            type Value = ProfitFactor;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "a number or \"{UNBOUNDED_TAG}\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(ProfitFactor::Finite(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(ProfitFactor::Finite(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(ProfitFactor::Finite(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == UNBOUNDED_TAG {
                    Ok(ProfitFactor::Unbounded)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(ProfitFactorVisitor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_trades: usize,
    pub open_trades: usize,
    pub completed_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    /// Fraction of completed trades that won, 0..=1.
    pub win_rate: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub net_pnl: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub expectancy: f64,
    pub profit_factor: ProfitFactor,
    pub max_drawdown: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

/// Derive performance statistics from a trade collection.
///
/// Only closed trades with an exit price count as completed; everything else
/// contributes to `total_trades` (and `open_trades` where applicable) only.
pub fn compute_metrics<'a, I>(trades: I) -> PerformanceMetrics
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut metrics = PerformanceMetrics::default();
    let mut completed: Vec<&Trade> = Vec::new();

    for trade in trades {
        metrics.total_trades += 1;
        if matches!(trade.status, TradeStatus::Open | TradeStatus::Monitoring) {
            metrics.open_trades += 1;
        }
        if trade.is_completed() {
            completed.push(trade);
        }
    }

    // Exit order drives the streak and drawdown figures
    completed.sort_by_key(|t| t.exit_date);

    let mut win_streak = 0;
    let mut loss_streak = 0;

    for trade in &completed {
        let Some(pnl) = trade.realized_pnl() else {
            continue;
        };
        metrics.completed_trades += 1;

        match TradeOutcome::from_pnl(pnl) {
            TradeOutcome::Win => {
                metrics.winning_trades += 1;
                metrics.total_profit += pnl;
                metrics.largest_win = metrics.largest_win.max(pnl);
                win_streak += 1;
                loss_streak = 0;
            }
            TradeOutcome::Loss => {
                metrics.losing_trades += 1;
                metrics.total_loss += pnl.abs();
                metrics.largest_loss = metrics.largest_loss.max(pnl.abs());
                loss_streak += 1;
                win_streak = 0;
            }
            TradeOutcome::Breakeven => {
                metrics.breakeven_trades += 1;
                win_streak = 0;
                loss_streak = 0;
            }
        }
        metrics.max_consecutive_wins = metrics.max_consecutive_wins.max(win_streak);
        metrics.max_consecutive_losses = metrics.max_consecutive_losses.max(loss_streak);
    }

    metrics.net_pnl = metrics.total_profit - metrics.total_loss;
    metrics.win_rate = ratio(metrics.winning_trades as f64, metrics.completed_trades);
    metrics.average_win = ratio(metrics.total_profit, metrics.winning_trades);
    metrics.average_loss = ratio(metrics.total_loss, metrics.losing_trades);
    metrics.expectancy = ratio(metrics.net_pnl, metrics.completed_trades);
    metrics.profit_factor = ProfitFactor::from_totals(metrics.total_profit, metrics.total_loss);
    metrics.max_drawdown = max_drawdown(completed.iter().filter_map(|t| t.realized_pnl()));

    metrics
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { numerator / count as f64 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThesisPerformance {
    pub thesis_id: String,
    pub title: String,
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub overall: PerformanceMetrics,
    pub unlinked: PerformanceMetrics,
    pub by_thesis: Vec<ThesisPerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_thesis_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst_thesis_id: Option<String>,
}

/// Overall, per-thesis and unlinked metrics, with theses ranked by net P&L.
///
/// `by_thesis` is ordered best first. Theses without completed trades are
/// listed but never chosen as best or worst.
pub fn portfolio_metrics(theses: &[Thesis], trades: &[Trade]) -> PortfolioMetrics {
    let overall = compute_metrics(trades);

    let known: std::collections::HashSet<&str> = theses.iter().map(|t| t.id.as_str()).collect();
    let unlinked = compute_metrics(trades.iter().filter(|t| {
        t.linked_thesis_id
            .as_deref()
            .is_none_or(|id| !known.contains(id))
    }));

    let mut by_thesis: Vec<ThesisPerformance> = theses
        .iter()
        .map(|thesis| ThesisPerformance {
            thesis_id: thesis.id.clone(),
            title: thesis.title.clone(),
            metrics: compute_metrics(
                trades
                    .iter()
                    .filter(|t| t.linked_thesis_id.as_deref() == Some(thesis.id.as_str())),
            ),
        })
        .collect();

    by_thesis.sort_by(|a, b| b.metrics.net_pnl.total_cmp(&a.metrics.net_pnl));

    let mut ranked = by_thesis.iter().filter(|p| p.metrics.completed_trades > 0);
    let best_thesis_id = ranked.next().map(|p| p.thesis_id.clone());
    let worst_thesis_id = ranked.last().map(|p| p.thesis_id.clone()).or_else(|| best_thesis_id.clone());

    PortfolioMetrics {
        overall,
        unlinked,
        by_thesis,
        best_thesis_id,
        worst_thesis_id,
    }
}
