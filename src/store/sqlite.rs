use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{NewswireError, Result};
use crate::domain::Article;
use crate::store::ArticleStore;

const ARTICLE_COLUMNS: &str = "id, title, content, preview, published, link";

/// Matches when the folded filter is empty or occurs in any searchable column.
const CONTENT_PREDICATE: &str = "?1 = ''
    OR instr(fold_case(content), ?1) > 0
    OR instr(fold_case(title), ?1) > 0
    OR instr(fold_case(preview), ?1) > 0";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| NewswireError::Other(format!("Migration failed: {}", e)))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NewswireError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn query_articles<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Article>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let articles = stmt
            .query_map(params, row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(articles)
    }
}

/// SQLite's own `lower()` only folds ASCII.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: String = ctx.get(0)?;
            Ok(value.to_lowercase())
        },
    )?;
    Ok(())
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        preview: row.get(3)?,
        published: row.get(4)?,
        link: row.get(5)?,
    })
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl ArticleStore for SqliteStore {
    fn insert(&self, article: &Article) -> Result<Option<i64>> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO news (title, content, preview, published, link)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article.title,
                article.content,
                article.preview,
                article.published,
                article.link
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }
        Ok(Some(conn.last_insert_rowid()))
    }

    fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let conn = self.conn()?;

        let article = conn
            .query_row(
                &format!("SELECT {} FROM news WHERE id = ?1", ARTICLE_COLUMNS),
                params![id],
                row_to_article,
            )
            .optional()?;

        Ok(article)
    }

    fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM news", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn list_paged(&self, window: usize, offset: usize, limit: usize) -> Result<Vec<Article>> {
        let sql = format!(
            "WITH latest AS (
                 SELECT {cols} FROM news ORDER BY published DESC, id DESC LIMIT ?1
             )
             SELECT {cols} FROM latest ORDER BY published DESC, id DESC LIMIT ?2 OFFSET ?3",
            cols = ARTICLE_COLUMNS
        );
        self.query_articles(
            &sql,
            params![to_sql_int(window), to_sql_int(limit), to_sql_int(offset)],
        )
    }

    fn count_by_content(&self, filter: &str) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM news WHERE {}", CONTENT_PREDICATE),
            params![filter.to_lowercase()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn filter_by_content_paged(&self, filter: &str, offset: usize, limit: usize) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {} FROM news WHERE {}
             ORDER BY published DESC, id DESC LIMIT ?2 OFFSET ?3",
            ARTICLE_COLUMNS, CONTENT_PREDICATE
        );
        self.query_articles(
            &sql,
            params![filter.to_lowercase(), to_sql_int(limit), to_sql_int(offset)],
        )
    }

    fn filter_by_published(&self, published: i64) -> Result<Vec<Article>> {
        let sql = format!(
            "SELECT {} FROM news WHERE published = ?1 ORDER BY id",
            ARTICLE_COLUMNS
        );
        self.query_articles(&sql, params![published])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str, published: i64) -> Article {
        Article::new(title, content, published, format!("https://example.com/{}", published))
            .with_preview()
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        for ts in 1..=25 {
            store
                .insert(&article(&format!("Title {}", ts), &format!("content number {}", ts), ts * 100))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_insert_assigns_increasing_ids() {
        let store = SqliteStore::in_memory().unwrap();
        let first = store.insert(&article("A", "alpha", 100)).unwrap().unwrap();
        let second = store.insert(&article("B", "beta", 200)).unwrap().unwrap();
        assert!(first >= 1);
        assert!(second > first);
    }

    #[test]
    fn test_insert_duplicate_is_ignored() {
        let store = SqliteStore::in_memory().unwrap();
        let a = article("A", "alpha", 100);
        assert!(store.insert(&a).unwrap().is_some());
        assert!(store.insert(&a).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_same_link_different_title_is_kept() {
        let store = SqliteStore::in_memory().unwrap();
        let mut a = article("A", "alpha", 100);
        store.insert(&a).unwrap();
        a.title = "A, updated".into();
        assert!(store.insert(&a).unwrap().is_some());
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_get_by_id_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let a = article("Title", "Some content here", 1729584999);
        let id = store.insert(&a).unwrap().unwrap();

        let stored = store.get_by_id(id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.title, a.title);
        assert_eq!(stored.content, a.content);
        assert_eq!(stored.preview, a.preview);
        assert_eq!(stored.published, a.published);
        assert_eq!(stored.link, a.link);
    }

    #[test]
    fn test_get_by_id_missing() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_by_id(999).unwrap().is_none());
    }

    #[test]
    fn test_list_paged_newest_first() {
        let store = seeded();
        let page = store.list_paged(25, 0, 10).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].published, 2500);
        assert_eq!(page[9].published, 1600);
    }

    #[test]
    fn test_list_paged_respects_window() {
        let store = seeded();
        let first = store.list_paged(12, 0, 10).unwrap();
        let second = store.list_paged(12, 10, 10).unwrap();
        let third = store.list_paged(12, 20, 10).unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 2);
        assert!(third.is_empty());
        assert_eq!(second[1].published, 1400);
    }

    #[test]
    fn test_content_filter_is_case_insensitive() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&article("Rust 1.80 released", "LazyLock lands", 1)).unwrap();
        store.insert(&article("Go news", "generics again", 2)).unwrap();

        assert_eq!(store.count_by_content("RUST").unwrap(), 1);
        assert_eq!(store.count_by_content("lazylock").unwrap(), 1);
        let hits = store.filter_by_content_paged("GENERICS", 0, 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Go news");
    }

    #[test]
    fn test_content_filter_folds_unicode() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&article("Новости", "Привет, мир", 1)).unwrap();
        assert_eq!(store.count_by_content("привет").unwrap(), 1);
        assert_eq!(store.count_by_content("НОВОСТИ").unwrap(), 1);
    }

    #[test]
    fn test_content_filter_treats_wildcards_literally() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&article("Discount", "now 50% off", 1)).unwrap();
        store.insert(&article("Other", "nothing here", 2)).unwrap();
        assert_eq!(store.count_by_content("50%").unwrap(), 1);
        assert_eq!(store.count_by_content("%").unwrap(), 1);
        assert_eq!(store.count_by_content("_").unwrap(), 0);
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let store = seeded();
        assert_eq!(store.count_by_content("").unwrap(), 25);
        assert_eq!(store.filter_by_content_paged("", 20, 10).unwrap().len(), 5);
    }

    #[test]
    fn test_count_and_page_use_same_predicate() {
        let store = seeded();
        // "content number 1" matches 1 and 10..=19
        let total = store.count_by_content("number 1").unwrap();
        assert_eq!(total, 11);
        let first = store.filter_by_content_paged("number 1", 0, 10).unwrap();
        let second = store.filter_by_content_paged("number 1", 10, 10).unwrap();
        assert_eq!(first.len() + second.len(), total);
    }

    #[test]
    fn test_filter_by_published_exact_match() {
        let store = SqliteStore::in_memory().unwrap();
        store.insert(&article("A", "a", 100)).unwrap();
        store.insert(&article("B", "b", 200)).unwrap();
        let mut same_time = article("C", "c", 200);
        same_time.link = "https://example.com/other".into();
        store.insert(&same_time).unwrap();

        let hits = store.filter_by_published(200).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|a| a.published == 200));
        assert!(store.filter_by_published(150).unwrap().is_empty());
    }

    #[test]
    fn test_reopen_on_disk_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.db");
        {
            let store = SqliteStore::new(&path).unwrap();
            store.insert(&article("A", "alpha", 100)).unwrap();
        }
        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }
}
