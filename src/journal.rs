use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::analytics::{
    compute_metrics, equity_curve, portfolio_metrics, EquityCurvePoint, PerformanceMetrics,
    PortfolioMetrics,
};
use crate::cache::TradeCache;
use crate::config::JournalConfig;
use crate::error::{EntityKind, StoreError, StoreResult};
use crate::models::{BackupData, Settings, Thesis, Trade, UpdateSettingsInput};
use crate::storage::{DataDir, ScreenshotStore, SettingsStore, ThesisStore, TradeStore};
use crate::view::{TradeView, TradeViewHandle, WeakTradeViewHandle};

/// One journal data directory and everything that reads or writes it.
///
/// Trade writes made through the journal keep the trade cache and every open
/// trade view coherent. Writes made through [`Journal::trades`] directly must
/// call [`Journal::invalidate_cache`].
pub struct Journal {
    config: JournalConfig,
    data_dir: DataDir,
    trades: Arc<TradeStore>,
    theses: ThesisStore,
    screenshots: ScreenshotStore,
    settings: SettingsStore,
    cache: TradeCache,
    views: Mutex<Vec<WeakTradeViewHandle>>,
}

impl Journal {
    /// Open (creating if needed) the data directory named by `config`.
    pub async fn open(config: JournalConfig) -> StoreResult<Self> {
        let data_dir = DataDir::new(&config.data_dir);
        data_dir.ensure().await?;

        let trades = Arc::new(TradeStore::new(data_dir.trades_dir()));
        let theses = ThesisStore::new(data_dir.theses_dir(), Arc::clone(&trades));

        Ok(Self {
            screenshots: ScreenshotStore::new(data_dir.screenshots_dir()),
            settings: SettingsStore::new(data_dir.settings_path()),
            cache: TradeCache::new(),
            views: Mutex::new(Vec::new()),
            config,
            data_dir,
            trades,
            theses,
        })
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &DataDir {
        &self.data_dir
    }

    pub fn trades(&self) -> &TradeStore {
        &self.trades
    }

    pub fn theses(&self) -> &ThesisStore {
        &self.theses
    }

    pub fn screenshots(&self) -> &ScreenshotStore {
        &self.screenshots
    }

    pub async fn invalidate_cache(&self) {
        self.trades_changed().await;
    }

    /// Drop the cached collection and push a fresh one to open views.
    async fn trades_changed(&self) {
        self.cache.invalidate().await;

        let live: Vec<TradeViewHandle> = {
            let mut views = self.views.lock().await;
            let mut live = Vec::with_capacity(views.len());
            views.retain(|weak| match weak.upgrade() {
                Some(handle) => {
                    live.push(handle);
                    true
                }
                None => false,
            });
            live
        };
        if live.is_empty() {
            return;
        }

        let trades = match self.all_trades().await {
            Ok(trades) => trades,
            Err(e) => {
                log::warn!("Open trade views not refreshed: {}", e);
                return;
            }
        };
        for handle in live {
            if handle.set_trades(trades.as_ref().clone()).await.is_err() {
                log::debug!("Trade view closed before refresh");
            }
        }
    }

    /// Cached, validated trade collection.
    pub async fn all_trades(&self) -> StoreResult<Arc<Vec<Trade>>> {
        self.cache.get_or_load(&self.trades).await
    }

    // Trades

    pub async fn save_trade(&self, trade: &Trade) -> StoreResult<String> {
        let result = self.trades.save(trade).await;
        // A failed relocation may still have written the new file
        self.trades_changed().await;
        result
    }

    /// Delete a trade and its screenshot files.
    pub async fn delete_trade(&self, id: &str) -> StoreResult<()> {
        let screenshots = match self.trades.load(id).await {
            Ok(trade) => trade.screenshots,
            Err(e @ (StoreError::NotFound { .. } | StoreError::InvalidId(_))) => return Err(e),
            Err(e) => {
                log::warn!("Deleting unreadable trade {} without its screenshots: {}", id, e);
                Vec::new()
            }
        };

        self.trades.delete(id).await?;
        self.trades_changed().await;

        for screenshot in &screenshots {
            if let Err(e) = self.screenshots.remove(screenshot).await {
                log::warn!("Could not remove screenshot {} of trade {}: {}", screenshot.path, id, e);
            }
        }
        Ok(())
    }

    pub async fn duplicate_trade(&self, id: &str) -> StoreResult<Trade> {
        let copy = self.trades.duplicate(id).await?;
        self.trades_changed().await;
        Ok(copy)
    }

    // Screenshots

    /// Store an image and attach it to the trade.
    pub async fn add_screenshot(
        &self,
        trade_id: &str,
        file_name: &str,
        base64_data: &str,
        caption: Option<String>,
    ) -> StoreResult<Trade> {
        let mut trade = self.trades.load(trade_id).await?;
        let screenshot = self
            .screenshots
            .store(trade_id, file_name, base64_data, caption)
            .await?;

        trade.screenshots.push(screenshot.clone());
        if let Err(e) = self.save_trade(&trade).await {
            // Don't leave an orphaned image behind
            if let Err(cleanup) = self.screenshots.remove(&screenshot).await {
                log::warn!("Orphaned screenshot {}: {}", screenshot.path, cleanup);
            }
            return Err(e);
        }

        self.trades.load(trade_id).await
    }

    /// Detach a screenshot from the trade, then delete its file.
    pub async fn remove_screenshot(&self, trade_id: &str, screenshot_id: &str) -> StoreResult<Trade> {
        let mut trade = self.trades.load(trade_id).await?;
        let position = trade
            .screenshots
            .iter()
            .position(|s| s.id == screenshot_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Screenshot, screenshot_id))?;

        let screenshot = trade.screenshots.remove(position);
        self.save_trade(&trade).await?;

        match self.screenshots.remove(&screenshot).await {
            Ok(()) | Err(StoreError::NotFound { .. }) => {}
            Err(e) => log::warn!("Could not remove screenshot file {}: {}", screenshot.path, e),
        }

        self.trades.load(trade_id).await
    }

    // Analytics

    pub async fn metrics(&self) -> StoreResult<PerformanceMetrics> {
        let trades = self.all_trades().await?;
        Ok(compute_metrics(trades.iter()))
    }

    /// Metrics over the trades linked to an existing thesis.
    pub async fn thesis_metrics(&self, thesis_id: &str) -> StoreResult<PerformanceMetrics> {
        let thesis = self.theses.load(thesis_id).await?;
        let trades = self.all_trades().await?;
        Ok(compute_metrics(
            trades
                .iter()
                .filter(|t| t.linked_thesis_id.as_deref() == Some(thesis.id.as_str())),
        ))
    }

    pub async fn portfolio_metrics(&self) -> StoreResult<PortfolioMetrics> {
        let theses = self.theses.load_all().await?;
        let trades = self.all_trades().await?;
        Ok(portfolio_metrics(&theses, &trades))
    }

    pub async fn equity_curve(&self) -> StoreResult<Vec<EquityCurvePoint>> {
        let trades = self.all_trades().await?;
        Ok(equity_curve(trades.iter()))
    }

    // Settings

    pub async fn settings(&self) -> StoreResult<Settings> {
        self.settings.load().await
    }

    pub async fn update_settings(&self, input: UpdateSettingsInput) -> StoreResult<Settings> {
        self.settings.update(input).await
    }

    // View

    /// Spawn a trade view seeded with the current collection, paged by the
    /// persisted default page size. The view is refreshed after every trade
    /// write made through the journal until its last handle is dropped.
    pub async fn open_trade_view(&self) -> StoreResult<TradeViewHandle> {
        let page_size = match self.settings.load().await {
            Ok(settings) => settings.default_page_size,
            Err(e) => {
                log::warn!("Using configured page size, settings unreadable: {}", e);
                self.config.default_page_size
            }
        };
        let trades = self.all_trades().await?;
        let handle = TradeViewHandle::spawn(TradeView::with_trades(
            trades.as_ref().clone(),
            page_size,
        ));
        self.views.lock().await.push(handle.downgrade());
        Ok(handle)
    }


    // Backup

    pub async fn entity_files(&self) -> StoreResult<Vec<PathBuf>> {
        self.data_dir.entity_files().await
    }

    pub async fn export_snapshot(&self) -> StoreResult<BackupData> {
        let trades = self.all_trades().await?;
        let theses: Vec<Thesis> = self.theses.load_all().await?;

        Ok(BackupData {
            settings: self.settings.load().await?,
            trades: trades.as_ref().clone(),
            theses,
            export_date: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// Replace the journal contents with an unpacked backup directory.
    pub async fn restore_backup(&self, source: &Path) -> StoreResult<()> {
        let result = self.data_dir.restore_from(source).await;
        self.trades_changed().await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quarter, TradeType};
    use crate::test_support::{closed_trade, open_trade, thesis};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use tempfile::TempDir;

    async fn journal(dir: &TempDir) -> Journal {
        Journal::open(JournalConfig::new(dir.path())).await.unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_layout() {
        let dir = TempDir::new().unwrap();
        let _journal = journal(&dir).await;
        assert!(dir.path().join("trades").is_dir());
        assert!(dir.path().join("theses").is_dir());
        assert!(dir.path().join("screenshots").is_dir());
    }

    #[tokio::test]
    async fn test_trade_writes_refresh_metrics() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;

        let win = closed_trade("AAPL", TradeType::Long, 100.0, 110.0, 1.0);
        journal.save_trade(&win).await.unwrap();
        assert_eq!(journal.metrics().await.unwrap().completed_trades, 1);

        let loss = closed_trade("MSFT", TradeType::Long, 100.0, 95.0, 1.0);
        journal.save_trade(&loss).await.unwrap();
        let metrics = journal.metrics().await.unwrap();
        assert_eq!(metrics.completed_trades, 2);
        assert_eq!(metrics.net_pnl, 5.0);

        journal.delete_trade(&win.id).await.unwrap();
        assert_eq!(journal.metrics().await.unwrap().completed_trades, 1);
    }

    #[tokio::test]
    async fn test_thesis_metrics_only_counts_linked_trades() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;

        let t = thesis("Semis", Quarter::Q2, 2024);
        let thesis_id = journal.theses().save(&t).await.unwrap();

        let mut linked = closed_trade("NVDA", TradeType::Long, 100.0, 120.0, 1.0);
        linked.linked_thesis_id = Some(thesis_id.clone());
        journal.save_trade(&linked).await.unwrap();
        journal
            .save_trade(&closed_trade("AMD", TradeType::Long, 100.0, 90.0, 1.0))
            .await
            .unwrap();

        let metrics = journal.thesis_metrics(&thesis_id).await.unwrap();
        assert_eq!(metrics.completed_trades, 1);
        assert_eq!(metrics.net_pnl, 20.0);

        let missing = journal.thesis_metrics("THESIS-404").await.unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_screenshot_lifecycle() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;

        let trade = open_trade("AAPL", TradeType::Long, 2024);
        journal.save_trade(&trade).await.unwrap();

        let updated = journal
            .add_screenshot(&trade.id, "entry.png", &BASE64.encode(b"img"), None)
            .await
            .unwrap();
        assert_eq!(updated.screenshots.len(), 1);
        let shot = updated.screenshots[0].clone();
        assert!(dir.path().join("screenshots").join(&shot.path).exists());

        let updated = journal.remove_screenshot(&trade.id, &shot.id).await.unwrap();
        assert!(updated.screenshots.is_empty());
        assert!(!dir.path().join("screenshots").join(&shot.path).exists());

        let err = journal.remove_screenshot(&trade.id, &shot.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: EntityKind::Screenshot, .. }));
    }

    #[tokio::test]
    async fn test_delete_trade_removes_screenshot_files() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;

        let trade = open_trade("AAPL", TradeType::Long, 2024);
        journal.save_trade(&trade).await.unwrap();
        let updated = journal
            .add_screenshot(&trade.id, "entry.png", &BASE64.encode(b"img"), None)
            .await
            .unwrap();
        let path = dir.path().join("screenshots").join(&updated.screenshots[0].path);

        journal.delete_trade(&trade.id).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_export_and_restore() {
        let source_dir = TempDir::new().unwrap();
        let source = journal(&source_dir).await;
        source
            .save_trade(&open_trade("AAPL", TradeType::Long, 2024))
            .await
            .unwrap();
        source.theses().save(&thesis("Macro", Quarter::Q1, 2024)).await.unwrap();

        let snapshot = source.export_snapshot().await.unwrap();
        assert_eq!(snapshot.trades.len(), 1);
        assert_eq!(snapshot.theses.len(), 1);
        assert_eq!(snapshot.version, env!("CARGO_PKG_VERSION"));

        let target_dir = TempDir::new().unwrap();
        let target = journal(&target_dir).await;
        target
            .save_trade(&open_trade("TSLA", TradeType::Short, 2023))
            .await
            .unwrap();
        assert_eq!(target.all_trades().await.unwrap().len(), 1);

        target.restore_backup(source_dir.path()).await.unwrap();
        let trades = target.all_trades().await.unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].ticker, "AAPL");
        assert_eq!(target.theses().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_view_uses_persisted_page_size() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;
        for ticker in ["A", "B", "C"] {
            journal
                .save_trade(&open_trade(ticker, TradeType::Long, 2024))
                .await
                .unwrap();
        }
        journal
            .update_settings(UpdateSettingsInput {
                default_page_size: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();

        let view = journal.open_trade_view().await.unwrap();
        let page = view.snapshot().await.unwrap();
        assert_eq!(page.page_size, 2);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_open_view_follows_trade_writes() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;
        let first = open_trade("AAPL", TradeType::Long, 2024);
        journal.save_trade(&first).await.unwrap();

        let view = journal.open_trade_view().await.unwrap();
        assert_eq!(view.snapshot().await.unwrap().total_items, 1);

        journal
            .save_trade(&open_trade("MSFT", TradeType::Short, 2023))
            .await
            .unwrap();
        assert_eq!(view.snapshot().await.unwrap().total_items, 2);

        let copy = journal.duplicate_trade(&first.id).await.unwrap();
        assert_eq!(view.snapshot().await.unwrap().total_items, 3);

        journal.delete_trade(&copy.id).await.unwrap();
        assert_eq!(view.snapshot().await.unwrap().total_items, 2);
    }

    #[tokio::test]
    async fn test_dropped_views_are_forgotten() {
        let dir = TempDir::new().unwrap();
        let journal = journal(&dir).await;

        let kept = journal.open_trade_view().await.unwrap();
        drop(journal.open_trade_view().await.unwrap());
        assert_eq!(journal.views.lock().await.len(), 2);

        journal
            .save_trade(&open_trade("AAPL", TradeType::Long, 2024))
            .await
            .unwrap();
        assert_eq!(journal.views.lock().await.len(), 1);
        assert_eq!(kept.snapshot().await.unwrap().total_items, 1);
    }
}
