//! Stateless page computation and filtering over an [`ArticleStore`].
//!
//! Validation failures are returned before the store is touched; store errors
//! are passed through untouched.

use crate::app::{NewswireError, Result};
use crate::domain::{Article, PageEnvelope, NEWS_PER_PAGE};
use crate::store::ArticleStore;

fn positive(value: i64, what: &str) -> Result<usize> {
    if value < 1 {
        return Err(NewswireError::Validation(format!("invalid {} - got {}", what, value)));
    }
    usize::try_from(value).map_err(|_| NewswireError::Validation(format!("invalid {} - got {}", what, value)))
}

/// 1-based page number whose row offset fits in `usize`.
fn page_number(value: i64) -> Result<usize> {
    let page = positive(value, "page")?;
    (page - 1)
        .checked_mul(NEWS_PER_PAGE)
        .map(|_| page)
        .ok_or_else(|| NewswireError::Validation(format!("page out of range - got {}", value)))
}

/// Single article by id.
pub fn detail(store: &dyn ArticleStore, id: i64) -> Result<Option<Article>> {
    if id < 1 {
        return Err(NewswireError::Validation(format!("invalid news ID - got {}", id)));
    }
    store.get_by_id(id)
}

/// Page `page` over the `count` most recently published articles.
pub fn list(store: &dyn ArticleStore, count: i64, page: i64) -> Result<PageEnvelope> {
    let count = positive(count, "count of news")?;
    let page = page_number(page)?;

    let total = store.count()?.min(count);
    let mut envelope = PageEnvelope::new(total, page);
    envelope.results = store.list_paged(count, envelope.offset(), envelope.limit())?;
    Ok(envelope)
}

/// Page `page` of the articles whose content, title or preview contains `filter`.
///
/// The count and the page are two separate reads; under concurrent ingestion
/// `total_pages` may trail what the page query sees.
pub fn filter_by_content(store: &dyn ArticleStore, filter: &str, page: i64) -> Result<PageEnvelope> {
    let page = page_number(page)?;

    let total = store.count_by_content(filter)?;
    let mut envelope = PageEnvelope::new(total, page);
    envelope.results = store.filter_by_content_paged(filter, envelope.offset(), envelope.limit())?;
    Ok(envelope)
}

/// Every article published at exactly `published`, unpaginated.
pub fn filter_by_published(store: &dyn ArticleStore, published: i64) -> Result<Vec<Article>> {
    store.filter_by_published(published)
}
