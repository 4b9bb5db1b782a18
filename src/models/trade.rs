use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::Screenshot;

/// |P&L| below this counts as breakeven.
pub const BREAKEVEN_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Long,
    Short,
}

impl TradeType {
    pub const VALUES: &'static [&'static str] = &["long", "short"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Planning,
    Open,
    Monitoring,
    Closed,
    Cancelled,
}

impl TradeStatus {
    pub const VALUES: &'static [&'static str] =
        &["planning", "open", "monitoring", "closed", "cancelled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Planning => "planning",
            TradeStatus::Open => "open",
            TradeStatus::Monitoring => "monitoring",
            TradeStatus::Closed => "closed",
            TradeStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeOutcome {
    Win,
    Loss,
    Breakeven,
}

impl TradeOutcome {
    pub const VALUES: &'static [&'static str] = &["win", "loss", "breakeven"];

    /// Classify a realized P&L figure.
    pub fn from_pnl(pnl: f64) -> Self {
        if pnl.abs() < BREAKEVEN_EPSILON {
            TradeOutcome::Breakeven
        } else if pnl > 0.0 {
            TradeOutcome::Win
        } else {
            TradeOutcome::Loss
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreTradeNotes {
    #[serde(default)]
    pub thesis: String,
    #[serde(default)]
    pub risk_assessment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostTradeNotes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TradeOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub exit_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub lessons_learned: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuringTradeNote {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub content: String,
}

impl DuringTradeNote {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub ticker: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub status: TradeStatus,

    pub entry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub quantity: f64,

    #[serde(default)]
    pub pre_trade_notes: PreTradeNotes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_trade_notes: Option<PostTradeNotes>,
    #[serde(default)]
    pub during_trade_notes: Vec<DuringTradeNote>,
    #[serde(default)]
    pub screenshots: Vec<Screenshot>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_thesis_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// A fresh trade in `open` status with a newly generated id.
    pub fn new(
        ticker: impl Into<String>,
        trade_type: TradeType,
        entry_date: DateTime<Utc>,
        entry_price: f64,
        quantity: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_trade_id(),
            ticker: ticker.into(),
            trade_type,
            status: TradeStatus::Open,
            entry_date,
            exit_date: None,
            entry_price,
            exit_price: None,
            quantity,
            pre_trade_notes: PreTradeNotes::default(),
            post_trade_notes: None,
            during_trade_notes: Vec::new(),
            screenshots: Vec::new(),
            tags: BTreeSet::new(),
            linked_thesis_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// P&L from prices; `None` until an exit price is recorded.
    pub fn computed_pnl(&self) -> Option<f64> {
        let exit = self.exit_price?;
        let gross = (exit - self.entry_price) * self.quantity;
        Some(match self.trade_type {
            TradeType::Long => gross,
            TradeType::Short => -gross,
        })
    }

    /// Recorded `profitLoss` if present, else computed from prices.
    /// `None` unless the trade is closed.
    pub fn realized_pnl(&self) -> Option<f64> {
        if self.status != TradeStatus::Closed {
            return None;
        }
        self.post_trade_notes
            .as_ref()
            .and_then(|n| n.profit_loss)
            .or_else(|| self.computed_pnl())
    }

    /// Closed with both prices present.
    pub fn is_completed(&self) -> bool {
        self.status == TradeStatus::Closed && self.exit_price.is_some()
    }

    /// Recorded outcome of a closed trade.
    pub fn outcome(&self) -> Option<TradeOutcome> {
        if self.status != TradeStatus::Closed {
            return None;
        }
        self.post_trade_notes.as_ref().and_then(|n| n.outcome)
    }

    /// Year directory the trade belongs in, derived from the entry date.
    pub fn partition_year(&self) -> i32 {
        self.entry_date.year()
    }

    /// Descriptive filename prefix, fixed at creation.
    pub fn file_prefix(&self) -> String {
        format!(
            "{}_{}",
            crate::storage::slugify(&self.ticker.to_uppercase()),
            self.entry_date.format("%Y-%m-%d")
        )
    }
}

pub fn new_trade_id() -> String {
    format!("TRADE-{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
}

/// Lightweight listing projection: no screenshots, no long-form notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSummary {
    pub id: String,
    pub ticker: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub status: TradeStatus,
    pub entry_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_date: Option<DateTime<Utc>>,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub quantity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TradeOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_loss: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_thesis_id: Option<String>,
    pub screenshot_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Trade> for TradeSummary {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id.clone(),
            ticker: trade.ticker.clone(),
            trade_type: trade.trade_type,
            status: trade.status,
            entry_date: trade.entry_date,
            exit_date: trade.exit_date,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            quantity: trade.quantity,
            outcome: trade.outcome(),
            profit_loss: trade.realized_pnl(),
            tags: trade.tags.clone(),
            linked_thesis_id: trade.linked_thesis_id.clone(),
            screenshot_count: trade.screenshots.len(),
            created_at: trade.created_at,
            updated_at: trade.updated_at,
        }
    }
}
