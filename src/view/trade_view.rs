use serde::{Deserialize, Serialize};

use super::filters::{SortSpec, TradeFilters};
use crate::models::{Trade, TradeSummary};

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// A state change applied to a [`TradeView`].
#[derive(Debug, Clone)]
pub enum ViewUpdate {
    Trades(Vec<Trade>),
    Filters(TradeFilters),
    ClearFilters,
    Sort(SortSpec),
    Page(usize),
    PageSize(usize),
}

/// Ready-to-render page of the projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPage {
    pub items: Vec<TradeSummary>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub filters: TradeFilters,
    pub sort: SortSpec,
}

/// Filtered, sorted and paged projection of the trade mirror.
///
/// The projection is recomputed eagerly on every change, so reads never
/// observe stale ordering. Pages are 1-based.
#[derive(Debug, Clone)]
pub struct TradeView {
    trades: Vec<Trade>,
    filters: TradeFilters,
    sort: SortSpec,
    page: usize,
    page_size: usize,
    // Indices into `trades`, filtered and sorted
    visible: Vec<usize>,
}

impl Default for TradeView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TradeView {
    pub fn new(page_size: usize) -> Self {
        Self {
            trades: Vec::new(),
            filters: TradeFilters::default(),
            sort: SortSpec::default(),
            page: 1,
            page_size: page_size.max(1),
            visible: Vec::new(),
        }
    }

    pub fn with_trades(trades: Vec<Trade>, page_size: usize) -> Self {
        let mut view = Self::new(page_size);
        view.set_trades(trades);
        view
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::Trades(trades) => self.set_trades(trades),
            ViewUpdate::Filters(filters) => self.set_filters(filters),
            ViewUpdate::ClearFilters => self.clear_filters(),
            ViewUpdate::Sort(sort) => self.set_sort(sort),
            ViewUpdate::Page(page) => self.set_page(page),
            ViewUpdate::PageSize(size) => self.set_page_size(size),
        }
    }

    /// Replace the base collection. The current page is kept when it still exists.
    pub fn set_trades(&mut self, trades: Vec<Trade>) {
        self.trades = trades;
        self.recompute();
        self.page = self.page.min(self.total_pages());
    }

    pub fn set_filters(&mut self, filters: TradeFilters) {
        self.filters = filters;
        self.recompute();
        self.page = 1;
    }

    pub fn clear_filters(&mut self) {
        self.set_filters(TradeFilters::default());
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.recompute();
        self.page = 1;
    }

    /// Jump to `page`, clamped into `1..=total_pages`.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn filters(&self) -> &TradeFilters {
        &self.filters
    }

    pub fn sort(&self) -> SortSpec {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_filtered(&self) -> usize {
        self.visible.len()
    }

    /// Never less than one, so an empty result still has a page to show.
    pub fn total_pages(&self) -> usize {
        self.visible.len().div_ceil(self.page_size).max(1)
    }

    /// Every trade passing the filters, in sort order.
    pub fn filtered(&self) -> impl Iterator<Item = &Trade> + '_ {
        self.visible.iter().map(|&i| &self.trades[i])
    }

    pub fn current_page(&self) -> Vec<&Trade> {
        self.filtered()
            .skip((self.page - 1) * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn snapshot(&self) -> ViewPage {
        ViewPage {
            items: self.current_page().into_iter().map(TradeSummary::from).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_filtered(),
            total_pages: self.total_pages(),
            filters: self.filters.clone(),
            sort: self.sort,
        }
    }

    fn recompute(&mut self) {
        let mut visible: Vec<usize> = self
            .trades
            .iter()
            .enumerate()
            .filter(|(_, t)| self.filters.matches(t))
            .map(|(i, _)| i)
            .collect();

        // sort_by is stable, equal keys keep mirror order
        visible.sort_by(|&a, &b| self.sort.compare(&self.trades[a], &self.trades[b]));
        self.visible = visible;

        log::trace!(
            "Trade view recomputed: {}/{} trades visible",
            self.visible.len(),
            self.trades.len()
        );
    }
}
