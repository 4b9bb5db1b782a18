use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{Trade, TradeOutcome, TradeStatus, TradeType};

/// Predicates over the trade mirror. `None` means "don't filter on this".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFilters {
    /// Case-insensitive ticker substring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<TradeType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<TradeOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TradeStatus>,
    /// Inclusive lower bound on entry date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on entry date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thesis_id: Option<String>,
    /// Free text matched against ticker, notes and tags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl TradeFilters {
    pub fn is_empty(&self) -> bool {
        *self == TradeFilters::default()
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(ticker) = non_blank(&self.ticker) {
            if !trade.ticker.to_lowercase().contains(&ticker.to_lowercase()) {
                return false;
            }
        }
        if self.trade_type.is_some_and(|t| t != trade.trade_type) {
            return false;
        }
        if self.status.is_some_and(|s| s != trade.status) {
            return false;
        }
        if let Some(outcome) = self.outcome {
            if effective_outcome(trade) != Some(outcome) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| trade.entry_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| trade.entry_date > to) {
            return false;
        }
        if let Some(thesis_id) = &self.thesis_id {
            if trade.linked_thesis_id.as_ref() != Some(thesis_id) {
                return false;
            }
        }
        if let Some(needle) = non_blank(&self.search) {
            if !search_matches(trade, &needle.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Recorded outcome, else the one implied by realized P&L. Only closed
/// trades have an outcome.
fn effective_outcome(trade: &Trade) -> Option<TradeOutcome> {
    if trade.status != TradeStatus::Closed {
        return None;
    }
    trade.outcome().or_else(|| {
        if trade.is_completed() {
            trade.realized_pnl().map(TradeOutcome::from_pnl)
        } else {
            None
        }
    })
}

fn search_matches(trade: &Trade, needle: &str) -> bool {
    let contains = |text: &str| text.to_lowercase().contains(needle);

    if contains(&trade.ticker)
        || contains(&trade.pre_trade_notes.thesis)
        || contains(&trade.pre_trade_notes.risk_assessment)
        || trade.tags.iter().any(|t| contains(t))
        || trade.during_trade_notes.iter().any(|n| contains(&n.content))
    {
        return true;
    }

    trade
        .post_trade_notes
        .as_ref()
        .is_some_and(|n| contains(&n.exit_reason) || contains(&n.lessons_learned))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    EntryDate,
    ExitDate,
    Ticker,
    Status,
    Type,
    ProfitLoss,
    Quantity,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Order two trades. Missing values sort last in either direction.
    pub fn compare(&self, a: &Trade, b: &Trade) -> Ordering {
        let dir = self.direction;
        match self.key {
            SortKey::EntryDate => dir.apply(a.entry_date.cmp(&b.entry_date)),
            SortKey::ExitDate => compare_present(a.exit_date, b.exit_date, dir, |x, y| x.cmp(y)),
            SortKey::Ticker => dir.apply(a.ticker.to_lowercase().cmp(&b.ticker.to_lowercase())),
            SortKey::Status => dir.apply(a.status.as_str().cmp(b.status.as_str())),
            SortKey::Type => dir.apply(type_rank(a.trade_type).cmp(&type_rank(b.trade_type))),
            SortKey::ProfitLoss => {
                compare_present(a.realized_pnl(), b.realized_pnl(), dir, |x, y| x.total_cmp(y))
            }
            SortKey::Quantity => dir.apply(a.quantity.total_cmp(&b.quantity)),
            SortKey::CreatedAt => dir.apply(a.created_at.cmp(&b.created_at)),
            SortKey::UpdatedAt => dir.apply(a.updated_at.cmp(&b.updated_at)),
        }
    }
}

fn type_rank(trade_type: TradeType) -> u8 {
    match trade_type {
        TradeType::Long => 0,
        TradeType::Short => 1,
    }
}

fn compare_present<T>(
    a: Option<T>,
    b: Option<T>,
    dir: SortDirection,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => dir.apply(cmp(&x, &y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
