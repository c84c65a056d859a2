//! Page arithmetic and fetch strategy selection for list views.

use crate::remote::{ListQuery, ListResult};

/// Number of pages needed for `total_count` rows. Never less than 1.
pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total_count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Pull a requested page into `[1, total_pages]`; `1` when there are no pages.
pub fn clamp_page(requested: u32, total_pages: u32) -> u32 {
    if total_pages == 0 {
        return 1;
    }
    requested.clamp(1, total_pages)
}

/// Page to show after a delete succeeded.
///
/// Deleting the last row of a page other than the first steps back one page,
/// otherwise the current page is kept.
pub fn on_delete_success(current_page: u32, remaining_items_on_page: usize) -> u32 {
    if remaining_items_on_page == 0 && current_page > 1 {
        current_page - 1
    } else {
        current_page
    }
}

/// Slice an already-filtered batch into one page.
pub fn paginate_locally<T>(items: Vec<T>, page: u32, page_size: u32) -> ListResult<T> {
    let page_size = page_size.max(1);
    let total_count = items.len() as u64;
    let page = clamp_page(page, total_pages(total_count, page_size));

    let start = (page as usize - 1).saturating_mul(page_size as usize);
    let page_items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();

    ListResult::new(page_items, total_count, page, page_size)
}

/// Where paging, filtering and searching happen for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One request per page; filters go to the server. The search term goes
    /// too when `server_search` is set, otherwise it narrows the page locally.
    ServerPaged { server_search: bool },
    /// One bounded request for everything, then search, filters and paging
    /// run in memory.
    ClientSide { fetch_limit: u32 },
}

impl Default for FetchStrategy {
    fn default() -> Self {
        FetchStrategy::ServerPaged {
            server_search: false,
        }
    }
}

/// What part of the query the user changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryChange {
    Page,
    PageSize,
    Filter,
    Search,
    Refresh,
}

/// Decides when a query change needs the network and what to ask for.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationTracker {
    strategy: FetchStrategy,
}

impl PaginationTracker {
    pub fn new(strategy: FetchStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    pub fn is_client_side(&self) -> bool {
        matches!(self.strategy, FetchStrategy::ClientSide { .. })
    }

    /// Whether `change` must go back to the server. `has_data` is false
    /// until the first successful fetch.
    pub fn needs_fetch(&self, change: QueryChange, has_data: bool) -> bool {
        if !has_data || change == QueryChange::Refresh {
            return true;
        }
        match self.strategy {
            FetchStrategy::ServerPaged { server_search } => match change {
                QueryChange::Search => server_search,
                _ => true,
            },
            FetchStrategy::ClientSide { .. } => false,
        }
    }

    /// Whether `change` sends the user back to page 1. A search narrowed
    /// locally on a server page keeps the page.
    pub fn resets_page(&self, change: QueryChange) -> bool {
        match change {
            QueryChange::Filter | QueryChange::PageSize => true,
            QueryChange::Search => match self.strategy {
                FetchStrategy::ServerPaged { server_search } => server_search,
                FetchStrategy::ClientSide { .. } => true,
            },
            QueryChange::Page | QueryChange::Refresh => false,
        }
    }

    /// The request actually sent for the user's `query`.
    pub fn request_for(&self, query: &ListQuery) -> ListQuery {
        match self.strategy {
            FetchStrategy::ServerPaged { .. } => query.clone(),
            FetchStrategy::ClientSide { fetch_limit } => ListQuery::new(fetch_limit),
        }
    }
}

/// One entry of a page navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSlot {
    Page(u32),
    Gap,
}

/// Compact page list: both edges, the pages around `current`, gaps between.
pub fn page_window(total_pages: u32, current: u32, edge: u32, around: u32) -> Vec<PageSlot> {
    if total_pages == 0 {
        return vec![];
    }

    let last = total_pages;
    let current = clamp_page(current, total_pages);
    let mut slots = Vec::new();

    let left_end = (1 + edge).min(last + 1);
    slots.extend((1..left_end).map(PageSlot::Page));

    let mid_start = left_end.max(current.saturating_sub(around));
    let mid_end = (current + around + 1).min(last + 1);
    if mid_start > left_end {
        slots.push(PageSlot::Gap);
    }
    slots.extend((mid_start..mid_end).map(PageSlot::Page));

    let right_start = mid_end.max(last.saturating_sub(edge) + 1);
    if right_start > mid_end {
        slots.push(PageSlot::Gap);
    }
    slots.extend((right_start..=last).map(PageSlot::Page));

    slots
}
