//! Presentation projection of the trade collection.

pub mod filters;
pub mod handle;
pub mod trade_view;

pub use filters::{SortDirection, SortKey, SortSpec, TradeFilters};
pub use handle::{TradeViewHandle, ViewClosed, WeakTradeViewHandle};
pub use trade_view::{TradeView, ViewPage, ViewUpdate, DEFAULT_PAGE_SIZE};
