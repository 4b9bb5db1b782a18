//! Structural and semantic gate applied to every document read from or
//! written to disk.
//!
//! Validation runs in three passes: field presence/type/enum checks against
//! the raw JSON (so violations name the offending field), typed decoding, and
//! cross-field consistency checks on the typed entity.

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::is_valid_id;
use crate::models::{MarketOutlook, Quarter, Thesis, Trade, TradeOutcome, TradeStatus, TradeType};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("field `{field}` must be {expected}")]
    WrongType { field: String, expected: &'static str },

    #[error("field `{field}` has invalid value {value:?} (expected one of {allowed:?})")]
    InvalidEnum {
        field: String,
        value: String,
        allowed: &'static [&'static str],
    },

    #[error("{0}")]
    Inconsistent(String),

    #[error("schema violation: {0}")]
    Schema(String),
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Text,
    Number,
    Integer,
    Bool,
    Object,
    Array,
    Timestamp,
    OneOf(&'static [&'static str]),
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Text => "a string",
            FieldKind::Number => "a number",
            FieldKind::Integer => "an integer",
            FieldKind::Bool => "a boolean",
            FieldKind::Object => "an object",
            FieldKind::Array => "an array",
            FieldKind::Timestamp => "an RFC 3339 timestamp",
            FieldKind::OneOf(_) => "a string",
        }
    }
}

struct FieldRule {
    /// Dotted path into the document.
    path: &'static str,
    kind: FieldKind,
    required: bool,
}

const fn required(path: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        path,
        kind,
        required: true,
    }
}

const fn optional(path: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        path,
        kind,
        required: false,
    }
}

const TRADE_RULES: &[FieldRule] = &[
    required("id", FieldKind::Text),
    required("ticker", FieldKind::Text),
    required("type", FieldKind::OneOf(TradeType::VALUES)),
    required("status", FieldKind::OneOf(TradeStatus::VALUES)),
    required("entryDate", FieldKind::Timestamp),
    optional("exitDate", FieldKind::Timestamp),
    required("entryPrice", FieldKind::Number),
    optional("exitPrice", FieldKind::Number),
    required("quantity", FieldKind::Number),
    optional("preTradeNotes", FieldKind::Object),
    optional("preTradeNotes.thesis", FieldKind::Text),
    optional("preTradeNotes.riskAssessment", FieldKind::Text),
    optional("preTradeNotes.targetPrice", FieldKind::Number),
    optional("preTradeNotes.stopLoss", FieldKind::Number),
    optional("postTradeNotes", FieldKind::Object),
    optional("postTradeNotes.outcome", FieldKind::OneOf(TradeOutcome::VALUES)),
    optional("postTradeNotes.profitLoss", FieldKind::Number),
    optional("duringTradeNotes", FieldKind::Array),
    optional("screenshots", FieldKind::Array),
    optional("tags", FieldKind::Array),
    optional("linkedThesisId", FieldKind::Text),
    required("createdAt", FieldKind::Timestamp),
    required("updatedAt", FieldKind::Timestamp),
];

const THESIS_RULES: &[FieldRule] = &[
    required("id", FieldKind::Text),
    required("title", FieldKind::Text),
    required("quarter", FieldKind::OneOf(Quarter::VALUES)),
    required("year", FieldKind::Integer),
    required("marketOutlook", FieldKind::OneOf(MarketOutlook::VALUES)),
    optional("strategies", FieldKind::Object),
    optional("riskParameters", FieldKind::Object),
    optional("riskParameters.maxPositionSize", FieldKind::Number),
    optional("riskParameters.maxDailyLoss", FieldKind::Number),
    optional("goals", FieldKind::Object),
    optional("goals.profitTarget", FieldKind::Number),
    optional("goals.winRateTarget", FieldKind::Number),
    optional("versions", FieldKind::Array),
    required("isActive", FieldKind::Bool),
    required("createdAt", FieldKind::Timestamp),
    required("updatedAt", FieldKind::Timestamp),
];

const MIN_YEAR: i32 = 1970;
const MAX_YEAR: i32 = 2200;

/// Validate raw document data as a trade.
pub fn validate_trade(raw: Value) -> Result<Trade, ValidationError> {
    check_rules(&raw, TRADE_RULES)?;
    let trade: Trade = decode(raw)?;
    check_trade(&trade)?;
    Ok(trade)
}

/// Validate raw document data as a thesis.
pub fn validate_thesis(raw: Value) -> Result<Thesis, ValidationError> {
    check_rules(&raw, THESIS_RULES)?;
    let thesis: Thesis = decode(raw)?;
    check_thesis(&thesis)?;
    Ok(thesis)
}

fn decode<T: DeserializeOwned>(raw: Value) -> Result<T, ValidationError> {
    serde_json::from_value(raw).map_err(|e| ValidationError::Schema(e.to_string()))
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, key| node.get(key))
}

fn check_rules(raw: &Value, rules: &[FieldRule]) -> Result<(), ValidationError> {
    if !raw.is_object() {
        return Err(ValidationError::WrongType {
            field: "<document>".to_string(),
            expected: "an object",
        });
    }

    for rule in rules {
        let value = match lookup(raw, rule.path) {
            None | Some(Value::Null) => {
                if rule.required {
                    return Err(ValidationError::MissingField(rule.path.to_string()));
                }
                continue;
            }
            Some(value) => value,
        };

        let ok = match rule.kind {
            FieldKind::Text => value.is_string(),
            FieldKind::Number => value.as_f64().is_some_and(f64::is_finite),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
            FieldKind::Bool => value.is_boolean(),
            FieldKind::Object => value.is_object(),
            FieldKind::Array => value.is_array(),
            FieldKind::Timestamp => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            FieldKind::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.iter().any(|a| *a == s) => true,
                Some(s) => {
                    return Err(ValidationError::InvalidEnum {
                        field: rule.path.to_string(),
                        value: s.to_string(),
                        allowed,
                    });
                }
                None => false,
            },
        };

        if !ok {
            return Err(ValidationError::WrongType {
                field: rule.path.to_string(),
                expected: rule.kind.expected(),
            });
        }
    }

    Ok(())
}

fn check_trade(trade: &Trade) -> Result<(), ValidationError> {
    if !is_valid_id(&trade.id) {
        return Err(ValidationError::Inconsistent(format!(
            "id {:?} may only contain letters, digits and '-'",
            trade.id
        )));
    }
    if trade.ticker.trim().is_empty() {
        return Err(ValidationError::Inconsistent("ticker must not be empty".to_string()));
    }
    if trade.entry_price <= 0.0 {
        return Err(ValidationError::Inconsistent(format!(
            "entryPrice must be positive, got {}",
            trade.entry_price
        )));
    }
    if trade.quantity <= 0.0 {
        return Err(ValidationError::Inconsistent(format!(
            "quantity must be positive, got {}",
            trade.quantity
        )));
    }

    match (trade.exit_price, trade.exit_date) {
        (Some(_), None) => {
            return Err(ValidationError::Inconsistent(
                "exitPrice is set but exitDate is missing".to_string(),
            ));
        }
        (Some(price), Some(_)) if price <= 0.0 => {
            return Err(ValidationError::Inconsistent(format!(
                "exitPrice must be positive, got {price}"
            )));
        }
        _ => {}
    }

    if let Some(exit_date) = trade.exit_date {
        if exit_date < trade.entry_date {
            return Err(ValidationError::Inconsistent(
                "exitDate is before entryDate".to_string(),
            ));
        }
    }

    if let Some(thesis_id) = &trade.linked_thesis_id {
        if !is_valid_id(thesis_id) {
            return Err(ValidationError::Inconsistent(format!(
                "linkedThesisId {thesis_id:?} is not a valid id"
            )));
        }
    }

    Ok(())
}

fn check_thesis(thesis: &Thesis) -> Result<(), ValidationError> {
    if !is_valid_id(&thesis.id) {
        return Err(ValidationError::Inconsistent(format!(
            "id {:?} may only contain letters, digits and '-'",
            thesis.id
        )));
    }
    if thesis.title.trim().is_empty() {
        return Err(ValidationError::Inconsistent("title must not be empty".to_string()));
    }
    if !(MIN_YEAR..=MAX_YEAR).contains(&thesis.year) {
        return Err(ValidationError::Inconsistent(format!(
            "year {} is outside {MIN_YEAR}..={MAX_YEAR}",
            thesis.year
        )));
    }
    if let Some(target) = thesis.goals.win_rate_target {
        if !(0.0..=100.0).contains(&target) {
            return Err(ValidationError::Inconsistent(format!(
                "goals.winRateTarget {target} is outside 0..=100"
            )));
        }
    }
    Ok(())
}
