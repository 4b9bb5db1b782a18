use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreResult;
use crate::models::Trade;
use crate::storage::TradeStore;

/// Validated trade collection shared by analytics and the view.
///
/// Filled lazily from the store and dropped on every trade write. Listing
/// commands still go to disk.
#[derive(Default)]
pub struct TradeCache {
    trades: RwLock<Option<Arc<Vec<Trade>>>>,
}

impl TradeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_load(&self, store: &TradeStore) -> StoreResult<Arc<Vec<Trade>>> {
        if let Some(trades) = self.trades.read().await.as_ref() {
            return Ok(Arc::clone(trades));
        }

        let mut slot = self.trades.write().await;
        // Another task may have filled it while we waited for the write lock
        if let Some(trades) = slot.as_ref() {
            return Ok(Arc::clone(trades));
        }

        let trades = Arc::new(store.load_all().await?);
        log::debug!("Trade cache filled with {} trades", trades.len());
        *slot = Some(Arc::clone(&trades));
        Ok(trades)
    }

    pub async fn invalidate(&self) {
        if self.trades.write().await.take().is_some() {
            log::debug!("Trade cache invalidated");
        }
    }

    pub async fn is_warm(&self) -> bool {
        self.trades.read().await.is_some()
    }
}
