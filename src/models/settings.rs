use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::view::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub initial_capital: f64,
    pub currency: String,
    pub default_page_size: usize,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Default for Settings {
    fn default() -> Self {
        let now = Utc::now().timestamp();
        Self {
            initial_capital: 10_000.0,
            currency: "USD".to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsInput {
    pub initial_capital: Option<f64>,
    pub currency: Option<String>,
    pub default_page_size: Option<usize>,
}

impl Settings {
    /// Apply only the provided fields.
    pub fn apply(&mut self, input: UpdateSettingsInput) {
        if let Some(val) = input.initial_capital {
            self.initial_capital = val;
        }
        if let Some(val) = input.currency {
            self.currency = val;
        }
        if let Some(val) = input.default_page_size {
            self.default_page_size = val.max(1);
        }
        self.updated_at = Utc::now().timestamp();
    }
}
