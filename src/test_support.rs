//! Fixtures shared by unit tests.

use chrono::{TimeZone, Utc};

use crate::models::{
    MarketOutlook, PostTradeNotes, Quarter, Thesis, Trade, TradeStatus, TradeType,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Open trade entered mid-June of `year`.
pub fn open_trade(ticker: &str, trade_type: TradeType, year: i32) -> Trade {
    init_logging();
    Trade::new(
        ticker,
        trade_type,
        Utc.with_ymd_and_hms(year, 6, 15, 14, 30, 0).unwrap(),
        100.0,
        10.0,
    )
}

/// Closed 2024 trade with both prices set.
pub fn closed_trade(ticker: &str, trade_type: TradeType, entry: f64, exit: f64, qty: f64) -> Trade {
    let mut trade = open_trade(ticker, trade_type, 2024);
    trade.entry_price = entry;
    trade.quantity = qty;
    trade.exit_price = Some(exit);
    trade.exit_date = Some(Utc.with_ymd_and_hms(2024, 6, 20, 20, 0, 0).unwrap());
    trade.status = TradeStatus::Closed;
    trade
}

/// Closed trade whose realized P&L is recorded explicitly.
pub fn closed_with_pnl(pnl: f64, exit_day: u32) -> Trade {
    let mut trade = open_trade("TEST", TradeType::Long, 2024);
    trade.exit_price = Some(100.0);
    trade.exit_date = Some(Utc.with_ymd_and_hms(2024, 7, exit_day, 20, 0, 0).unwrap());
    trade.status = TradeStatus::Closed;
    trade.post_trade_notes = Some(PostTradeNotes {
        profit_loss: Some(pnl),
        ..Default::default()
    });
    trade
}

pub fn thesis(title: &str, quarter: Quarter, year: i32) -> Thesis {
    init_logging();
    Thesis::new(title, quarter, year, MarketOutlook::Neutral)
}
