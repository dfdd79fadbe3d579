use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{NewswireError, Result};
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::store::{SharedStore, SqliteStore};

pub struct AppContext {
    pub config: Config,
    pub store: SharedStore,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let db_path = match &config.database {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!(path = %db_path.display(), "opening store");
        let store: SharedStore = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new()?);

        Ok(Self {
            config,
            store,
            fetcher,
            normalizer: Normalizer::new(),
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NewswireError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("newswire").join("newswire.db"))
    }
}
