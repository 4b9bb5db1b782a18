use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

use super::locator::{DirectoryLocator, Locator};
use super::validator::validate_trade;
use super::{ensure_valid_id, read_entity, write_entity};
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::models::{new_trade_id, Trade, TradeStatus, TradeSummary};

/// Trade documents under `trades/<year>/<prefix>_<id>.json`.
pub struct TradeStore {
    locator: Arc<dyn Locator>,
}

impl TradeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_locator(Arc::new(DirectoryLocator::recursive(root)))
    }

    pub fn with_locator(locator: Arc<dyn Locator>) -> Self {
        Self { locator }
    }

    /// Validate and write the full document, returning its id.
    ///
    /// The filename prefix chosen at creation is kept for the life of the
    /// trade. If the entry year changed, the file moves to the new year
    /// directory under that same name.
    pub async fn save(&self, trade: &Trade) -> StoreResult<String> {
        ensure_valid_id(&trade.id)?;

        let existing = self.locator.locate(&trade.id).await?;
        let now = Utc::now();

        let mut trade = trade.clone();
        trade.updated_at = now;
        match &existing {
            Some(path) => match read_entity(path, validate_trade).await {
                Ok(persisted) => trade.created_at = persisted.created_at,
                Err(e) => log::warn!("Keeping caller createdAt for {}: {}", trade.id, e),
            },
            None => trade.created_at = now,
        }

        let trade = validate_trade(serde_json::to_value(&trade)?)?;

        let partition = self.locator.root().join(trade.partition_year().to_string());
        fs::create_dir_all(&partition).await?;

        let file_name = match existing.as_ref().and_then(|p| p.file_name()) {
            Some(name) => PathBuf::from(name),
            None => PathBuf::from(format!("{}_{}.json", trade.file_prefix(), trade.id)),
        };
        let target = partition.join(file_name);

        write_entity(&target, &trade).await?;

        if let Some(old) = existing {
            if old != target {
                // Not atomic: a failure here leaves both copies and the
                // locator resolves whichever sorts first.
                fs::remove_file(&old).await?;
                log::info!("Relocated trade {} from {:?} to {:?}", trade.id, old, target);
            }
        }

        log::debug!("Saved trade {} to {:?}", trade.id, target);
        Ok(trade.id)
    }

    pub async fn load(&self, id: &str) -> StoreResult<Trade> {
        let path = self
            .locator
            .locate(id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Trade, id))?;

        read_entity(&path, validate_trade).await
    }

    /// Every readable, valid trade. Files failing any stage are skipped.
    pub async fn load_all(&self) -> StoreResult<Vec<Trade>> {
        let mut trades = Vec::new();

        for path in self.locator.entries().await? {
            match read_entity(&path, validate_trade).await {
                Ok(trade) => trades.push(trade),
                Err(e) => log::warn!("Skipping trade file {:?} ({:?}): {}", path, e.kind(), e),
            }
        }

        trades.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trades)
    }

    /// Summaries of all trades, newest first.
    pub async fn list(&self) -> StoreResult<Vec<TradeSummary>> {
        let trades = self.load_all().await?;
        Ok(trades.iter().map(TradeSummary::from).collect())
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let path = self
            .locator
            .locate(id)
            .await?
            .ok_or_else(|| StoreError::not_found(EntityKind::Trade, id))?;

        fs::remove_file(&path).await?;
        log::info!("Deleted trade {}", id);
        Ok(())
    }

    /// Copy a trade as a new plan: fresh id, `planning` status, execution
    /// data cleared.
    pub async fn duplicate(&self, id: &str) -> StoreResult<Trade> {
        let original = self.load(id).await?;

        let mut copy = original.clone();
        copy.id = new_trade_id();
        copy.status = TradeStatus::Planning;
        copy.exit_date = None;
        copy.exit_price = None;
        copy.post_trade_notes = None;
        copy.during_trade_notes.clear();
        copy.screenshots.clear();
        copy.pre_trade_notes.thesis = if original.pre_trade_notes.thesis.is_empty() {
            "(Copy)".to_string()
        } else {
            format!("{} (Copy)", original.pre_trade_notes.thesis)
        };

        let new_id = self.save(&copy).await?;
        self.load(&new_id).await
    }

    /// Trades whose `linkedThesisId` is `thesis_id`.
    pub async fn linked_to(&self, thesis_id: &str) -> StoreResult<Vec<Trade>> {
        let trades = self.load_all().await?;
        Ok(trades
            .into_iter()
            .filter(|t| t.linked_thesis_id.as_deref() == Some(thesis_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostTradeNotes, TradeType};
    use crate::test_support::{closed_trade, open_trade};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> TradeStore {
        TradeStore::new(dir.path().join("trades"))
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut trade = open_trade("AAPL", TradeType::Long, 2024);
        trade.tags.insert("breakout".to_string());
        trade.pre_trade_notes.stop_loss = Some(170.0);

        let id = store.save(&trade).await.unwrap();
        let loaded = store.load(&id).await.unwrap();

        assert_eq!(loaded.id, trade.id);
        assert_eq!(loaded.ticker, trade.ticker);
        assert_eq!(loaded.tags, trade.tags);
        assert_eq!(loaded.pre_trade_notes, trade.pre_trade_notes);
        assert_eq!(loaded.entry_date, trade.entry_date);
    }

    #[tokio::test]
    async fn test_partitioned_by_entry_year() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let trade = open_trade("MSFT", TradeType::Short, 2023);

        store.save(&trade).await.unwrap();

        let expected = dir
            .path()
            .join("trades/2023")
            .join(format!("MSFT_2023-06-15_{}.json", trade.id));
        assert!(expected.exists());
    }

    #[tokio::test]
    async fn test_update_keeps_filename_and_created_at() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let trade = open_trade("AAPL", TradeType::Long, 2024);
        store.save(&trade).await.unwrap();
        let first = store.load(&trade.id).await.unwrap();

        let mut edited = first.clone();
        edited.ticker = "AAPL.US".to_string();
        edited.created_at = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        store.save(&edited).await.unwrap();

        let reloaded = store.load(&trade.id).await.unwrap();
        assert_eq!(reloaded.ticker, "AAPL.US");
        assert_eq!(reloaded.created_at, first.created_at);
        assert!(dir
            .path()
            .join("trades/2024")
            .join(format!("AAPL_2024-06-15_{}.json", trade.id))
            .exists());
    }

    #[tokio::test]
    async fn test_entry_year_change_relocates() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut trade = open_trade("NVDA", TradeType::Long, 2024);
        store.save(&trade).await.unwrap();

        trade.entry_date = Utc.with_ymd_and_hms(2023, 12, 29, 15, 0, 0).unwrap();
        store.save(&trade).await.unwrap();

        let old = dir
            .path()
            .join("trades/2024")
            .join(format!("NVDA_2024-06-15_{}.json", trade.id));
        let new = dir
            .path()
            .join("trades/2023")
            .join(format!("NVDA_2024-06-15_{}.json", trade.id));
        assert!(!old.exists());
        assert!(new.exists());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_trade() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut trade = open_trade("AAPL", TradeType::Long, 2024);
        trade.exit_price = Some(200.0);

        let err = store.save(&trade).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidEntity);
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_load_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let trade = open_trade("AAPL", TradeType::Long, 2024);
        store.save(&trade).await.unwrap();

        store.delete(&trade.id).await.unwrap();
        let err = store.load(&trade.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Trade, .. }));

        let err = store.delete(&trade.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_load_distinguishes_corrupt_from_invalid() {
        let dir = TempDir::new().unwrap();
        let partition = dir.path().join("trades/2024");
        fs::create_dir_all(&partition).await.unwrap();
        fs::write(partition.join("AAPL_2024-01-01_BAD-1.json"), "{ not json")
            .await
            .unwrap();
        fs::write(partition.join("AAPL_2024-01-01_BAD-2.json"), r#"{"id": "BAD-2"}"#)
            .await
            .unwrap();

        let store = store(&dir);
        assert!(matches!(store.load("BAD-1").await, Err(StoreError::CorruptData { .. })));
        assert!(matches!(store.load("BAD-2").await, Err(StoreError::InvalidEntity(_))));
    }

    #[tokio::test]
    async fn test_list_skips_malformed_and_sorts_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let mut ids = Vec::new();
        for (i, ticker) in ["AAA", "BBB", "CCC"].iter().enumerate() {
            let trade = open_trade(ticker, TradeType::Long, 2024);
            store.save(&trade).await.unwrap();
            ids.push(trade.id);
            // distinct createdAt values
            tokio::time::sleep(std::time::Duration::from_millis(5 * (i as u64 + 1))).await;
        }
        fs::write(
            dir.path().join("trades/2024/ZZZ_2024-01-01_BROKEN-1.json"),
            "garbage",
        )
        .await
        .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].id, ids[2]);
        assert_eq!(listed[2].id, ids[0]);
    }

    #[tokio::test]
    async fn test_list_skips_well_formed_but_invalid_trades() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let good = open_trade("AAPL", TradeType::Long, 2024);
        store.save(&good).await.unwrap();

        let partition = dir.path().join("trades/2024");
        fs::write(partition.join("X_2024-01-01_X-1.json"), r#"{"id":"X-1"}"#)
            .await
            .unwrap();
        let mut sideways = serde_json::to_value(open_trade("MSFT", TradeType::Long, 2024)).unwrap();
        sideways["id"] = "X-2".into();
        sideways["type"] = "sideways".into();
        fs::write(
            partition.join("MSFT_2024-01-01_X-2.json"),
            serde_json::to_string(&sideways).unwrap(),
        )
        .await
        .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, good.id);
        assert!(matches!(store.load("X-2").await, Err(StoreError::InvalidEntity(_))));
    }

    #[tokio::test]
    async fn test_summary_carries_realized_pnl() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let trade = closed_trade("AAPL", TradeType::Short, 100.0, 90.0, 5.0);
        store.save(&trade).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].profit_loss, Some(50.0));
    }

    #[tokio::test]
    async fn test_duplicate_resets_execution() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut trade = closed_trade("AAPL", TradeType::Long, 100.0, 110.0, 1.0);
        trade.post_trade_notes = Some(PostTradeNotes {
            lessons_learned: "patience".to_string(),
            ..Default::default()
        });
        trade.pre_trade_notes.thesis = "Breakout".to_string();
        store.save(&trade).await.unwrap();

        let copy = store.duplicate(&trade.id).await.unwrap();
        assert_ne!(copy.id, trade.id);
        assert_eq!(copy.status, TradeStatus::Planning);
        assert_eq!(copy.exit_price, None);
        assert_eq!(copy.post_trade_notes, None);
        assert_eq!(copy.pre_trade_notes.thesis, "Breakout (Copy)");
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_linked_to() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut linked = open_trade("AAPL", TradeType::Long, 2024);
        linked.linked_thesis_id = Some("THESIS-1".to_string());
        store.save(&linked).await.unwrap();
        store.save(&open_trade("MSFT", TradeType::Long, 2024)).await.unwrap();

        let found = store.linked_to("THESIS-1").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, linked.id);
    }
}
