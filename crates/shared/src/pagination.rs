//! Page-number pagination utilities.
//!
//! Upstream listings are addressed by 1-based page numbers while the
//! property-management API itself speaks `offset`/`limit`. [`PageWalk`]
//! tracks a sequential walk over such a listing and decides when to stop.

use thiserror::Error;

/// Error type for page arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("Page numbers start at 1")]
    InvalidPage,
    #[error("Page size must be positive")]
    InvalidPageSize,
}

/// Converts a 1-based page number into an `offset` for the given page size.
pub fn offset_for(page: u32, page_size: u32) -> Result<u64, PageError> {
    if page == 0 {
        return Err(PageError::InvalidPage);
    }
    if page_size == 0 {
        return Err(PageError::InvalidPageSize);
    }
    Ok(u64::from(page - 1) * u64::from(page_size))
}

/// Sequential walk over a page-numbered listing.
///
/// The walk ends when a page comes back short (fewer items than the page
/// size), when the cumulative count reaches the server-reported total, or
/// when the caller aborts it after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWalk {
    page_size: u32,
    next_page: u32,
    fetched: u64,
    pages_fetched: u32,
    finished: bool,
}

impl PageWalk {
    /// Start a walk at page 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            next_page: 1,
            fetched: 0,
            pages_fetched: 0,
            finished: false,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The page to fetch next, or `None` once the walk is finished.
    pub fn next_page(&self) -> Option<u32> {
        if self.finished {
            None
        } else {
            Some(self.next_page)
        }
    }

    /// Record a successfully fetched page.
    ///
    /// `returned` is the number of items on the page; `total` is the
    /// server-reported total, when the server reports one.
    pub fn record(&mut self, returned: usize, total: Option<u64>) {
        if self.finished {
            return;
        }

        self.fetched += returned as u64;
        self.pages_fetched += 1;
        self.next_page += 1;

        let short_page = returned < self.page_size as usize;
        let reached_total = total.is_some_and(|t| self.fetched >= t);
        if short_page || reached_total {
            self.finished = true;
        }
    }

    /// Stop the walk without recording a page (e.g. after a failed fetch).
    pub fn abort(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Cumulative number of items fetched so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }
}
