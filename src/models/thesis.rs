use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

use super::VersionHistory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const VALUES: &'static [&'static str] = &["Q1", "Q2", "Q3", "Q4"];

    pub fn number(&self) -> u32 {
        match self {
            Quarter::Q1 => 1,
            Quarter::Q2 => 2,
            Quarter::Q3 => 3,
            Quarter::Q4 => 4,
        }
    }

    /// Quarter containing a calendar month (1-12).
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Quarter::Q1),
            4..=6 => Some(Quarter::Q2),
            7..=9 => Some(Quarter::Q3),
            10..=12 => Some(Quarter::Q4),
            _ => None,
        }
    }

    pub fn current() -> (i32, Self) {
        let today = Utc::now().date_naive();
        (today.year(), Self::from_month(today.month()).unwrap_or(Quarter::Q1))
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketOutlook {
    Bullish,
    Bearish,
    Neutral,
}

impl MarketOutlook {
    pub const VALUES: &'static [&'static str] = &["bullish", "bearish", "neutral"];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Strategies {
    #[serde(default)]
    pub focus: BTreeSet<String>,
    #[serde(default)]
    pub avoid: BTreeSet<String>,
    #[serde(default)]
    pub themes: BTreeSet<String>,
    #[serde(default)]
    pub sectors: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_position_size: Option<f64>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stop_loss_rules: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_daily_loss: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_open_positions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_per_trade: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win_rate_target: Option<f64>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thesis {
    pub id: String,
    pub title: String,
    pub quarter: Quarter,
    pub year: i32,
    pub market_outlook: MarketOutlook,
    #[serde(default)]
    pub strategies: Strategies,
    #[serde(default)]
    pub risk_parameters: RiskParameters,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default)]
    pub versions: VersionHistory,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thesis {
    /// A fresh active thesis with an empty history.
    pub fn new(
        title: impl Into<String>,
        quarter: Quarter,
        year: i32,
        market_outlook: MarketOutlook,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: new_thesis_id(),
            title: title.into(),
            quarter,
            year,
            market_outlook,
            strategies: Strategies::default(),
            risk_parameters: RiskParameters::default(),
            goals: Goals::default(),
            versions: VersionHistory::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn file_prefix(&self) -> String {
        format!(
            "{}_{}-{}",
            crate::storage::slugify(&self.title),
            self.year,
            self.quarter
        )
    }
}

pub fn new_thesis_id() -> String {
    format!("THESIS-{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThesisSummary {
    pub id: String,
    pub title: String,
    pub quarter: Quarter,
    pub year: i32,
    pub market_outlook: MarketOutlook,
    pub is_active: bool,
    pub version_count: usize,
    pub trade_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ThesisSummary {
    pub fn from_thesis(thesis: &Thesis, trade_count: usize) -> Self {
        Self {
            id: thesis.id.clone(),
            title: thesis.title.clone(),
            quarter: thesis.quarter,
            year: thesis.year,
            market_outlook: thesis.market_outlook,
            is_active: thesis.is_active,
            version_count: thesis.versions.len(),
            trade_count,
            created_at: thesis.created_at,
            updated_at: thesis.updated_at,
        }
    }
}
