use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::filters::{SortSpec, TradeFilters};
use super::trade_view::{TradeView, ViewPage, ViewUpdate};
use crate::models::Trade;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
#[error("trade view task has stopped")]
pub struct ViewClosed;

struct ViewRequest {
    update: Option<ViewUpdate>,
    reply: oneshot::Sender<ViewPage>,
}

/// Cloneable handle to a [`TradeView`] owned by a single task.
///
/// Every request applies its update and replies with the page as it stands
/// afterwards, so callers never see a half-recomputed projection.
#[derive(Clone)]
pub struct TradeViewHandle {
    tx: mpsc::Sender<ViewRequest>,
}

impl TradeViewHandle {
    /// Spawn the owning task. Must be called inside a tokio runtime.
    pub fn spawn(mut view: TradeView) -> Self {
        let (tx, mut rx) = mpsc::channel::<ViewRequest>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                if let Some(update) = request.update {
                    view.apply(update);
                }
                // Caller may have given up waiting
                let _ = request.reply.send(view.snapshot());
            }
            log::debug!("Trade view task finished");
        });

        Self { tx }
    }

    /// A reference that doesn't keep the view task alive.
    pub fn downgrade(&self) -> WeakTradeViewHandle {
        WeakTradeViewHandle {
            tx: self.tx.downgrade(),
        }
    }

    pub async fn snapshot(&self) -> Result<ViewPage, ViewClosed> {
        self.request(None).await
    }

    pub async fn set_trades(&self, trades: Vec<Trade>) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::Trades(trades))).await
    }

    pub async fn set_filters(&self, filters: TradeFilters) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::Filters(filters))).await
    }

    pub async fn clear_filters(&self) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::ClearFilters)).await
    }

    pub async fn set_sort(&self, sort: SortSpec) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::Sort(sort))).await
    }

    pub async fn set_page(&self, page: usize) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::Page(page))).await
    }

    pub async fn set_page_size(&self, page_size: usize) -> Result<ViewPage, ViewClosed> {
        self.request(Some(ViewUpdate::PageSize(page_size))).await
    }

    async fn request(&self, update: Option<ViewUpdate>) -> Result<ViewPage, ViewClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ViewRequest { update, reply })
            .await
            .map_err(|_| ViewClosed)?;
        rx.await.map_err(|_| ViewClosed)
    }
}

/// Non-owning [`TradeViewHandle`]; the view task stops once every strong
/// handle is dropped.
#[derive(Clone)]
pub struct WeakTradeViewHandle {
    tx: mpsc::WeakSender<ViewRequest>,
}

impl WeakTradeViewHandle {
    pub fn upgrade(&self) -> Option<TradeViewHandle> {
        self.tx.upgrade().map(|tx| TradeViewHandle { tx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeType;
    use crate::test_support::open_trade;

    #[tokio::test]
    async fn test_handle_applies_updates_in_order() {
        let handle = TradeViewHandle::spawn(TradeView::new(1));

        let page = handle
            .set_trades(vec![
                open_trade("AAPL", TradeType::Long, 2024),
                open_trade("TSLA", TradeType::Short, 2023),
            ])
            .await
            .unwrap();
        assert_eq!(page.total_pages, 2);

        let page = handle.set_page(2).await.unwrap();
        assert_eq!(page.page, 2);
        assert_eq!(page.items[0].ticker, "TSLA");

        let page = handle
            .set_filters(TradeFilters {
                trade_type: Some(TradeType::Short),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_items, 1);

        let page = handle.clear_filters().await.unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[tokio::test]
    async fn test_clones_share_one_view() {
        let handle = TradeViewHandle::spawn(TradeView::default());
        let other = handle.clone();

        handle
            .set_trades(vec![open_trade("AAPL", TradeType::Long, 2024)])
            .await
            .unwrap();
        let page = other.snapshot().await.unwrap();
        assert_eq!(page.total_items, 1);
    }

    #[tokio::test]
    async fn test_weak_handle_does_not_keep_view_alive() {
        let handle = TradeViewHandle::spawn(TradeView::default());
        let weak = handle.downgrade();
        assert!(weak.upgrade().is_some());

        drop(handle);
        assert!(weak.upgrade().is_none());
    }
}
