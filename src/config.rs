use std::path::PathBuf;

use crate::view::DEFAULT_PAGE_SIZE;

pub const DATA_DIR_ENV: &str = "TRADING_JOURNAL_DATA_DIR";
pub const PAGE_SIZE_ENV: &str = "TRADING_JOURNAL_PAGE_SIZE";
const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone, PartialEq)]
pub struct JournalConfig {
    /// Root holding `trades/`, `theses/`, `screenshots/` and `settings.json`.
    pub data_dir: PathBuf,
    pub default_page_size: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl JournalConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let default_page_size = match lookup(PAGE_SIZE_ENV) {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    log::warn!("Ignoring invalid {}={:?}", PAGE_SIZE_ENV, raw);
                    defaults.default_page_size
                }
            },
            None => defaults.default_page_size,
        };

        Self {
            data_dir,
            default_page_size,
        }
    }
}
