use serde::{Deserialize, Serialize};

use super::Article;

/// Articles per page for every paginated query.
pub const NEWS_PER_PAGE: usize = 10;

/// `floor(total / size)`, plus one when there is a remainder. Zero results give zero pages.
pub fn total_pages(total_results: usize, page_size: usize) -> usize {
    let mut pages = total_results / page_size;
    if pages * page_size < total_results {
        pages += 1;
    }
    pages
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEnvelope {
    pub total_results: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub news_per_page: usize,
    pub results: Vec<Article>,
}

impl PageEnvelope {
    /// Empty envelope for `current_page` (1-based, not checked against `total_pages`).
    pub fn new(total_results: usize, current_page: usize) -> Self {
        Self {
            total_results,
            total_pages: total_pages(total_results, NEWS_PER_PAGE),
            current_page,
            news_per_page: NEWS_PER_PAGE,
            results: Vec::new(),
        }
    }

    /// Rows to skip; saturates for pages no store could ever reach.
    pub fn offset(&self) -> usize {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.news_per_page)
    }

    pub fn limit(&self) -> usize {
        self.news_per_page
    }
}
