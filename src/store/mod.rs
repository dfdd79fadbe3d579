pub mod sqlite;

use std::sync::Arc;

use crate::app::Result;
use crate::domain::Article;

pub use sqlite::SqliteStore;

/// Narrow capability interface over the article store.
///
/// Each call is its own unit of work; nothing here spans statements.
pub trait ArticleStore {
    /// Insert a new article, returning its id, or `None` when an identical
    /// entry (same link, title and published time) is already stored.
    fn insert(&self, article: &Article) -> Result<Option<i64>>;
    fn get_by_id(&self, id: i64) -> Result<Option<Article>>;
    fn count(&self) -> Result<usize>;

    /// Page `offset..offset + limit` of the `window` most recently published articles.
    fn list_paged(&self, window: usize, offset: usize, limit: usize) -> Result<Vec<Article>>;

    /// Case-insensitive substring match against content, title or preview.
    fn count_by_content(&self, filter: &str) -> Result<usize>;
    fn filter_by_content_paged(&self, filter: &str, offset: usize, limit: usize) -> Result<Vec<Article>>;

    fn filter_by_published(&self, published: i64) -> Result<Vec<Article>>;
}

pub type SharedStore = Arc<dyn ArticleStore + Send + Sync>;
