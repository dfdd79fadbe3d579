//! Configuration management for newswire.
//!
//! Configuration is read from `~/.config/newswire/config.toml` unless a path is
//! given on the command line. Missing tables and keys fall back to defaults.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::SourceDescriptor;
use crate::pipeline::PipelineConfig;

/// Number of outbound topics, one per query route.
pub const TOPIC_COUNT: usize = 4;

/// Longest accepted polling interval: one week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: Vec<String>,
    pub interval_minutes: u64,
    pub database: Option<PathBuf>,
    pub server: ServerConfig,
    pub bus: BusConfig,
    pub pipeline: PipelineSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            interval_minutes: 5,
            database: None,
            server: ServerConfig::default(),
            bus: BusConfig::default(),
            pipeline: PipelineSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub input_channel: String,
    /// Positional: detail, list, content filter, date filter.
    pub topics: Vec<String>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            input_channel: "news_input".into(),
            topics: vec![
                "news_detail".into(),
                "news_list".into(),
                "news_filtered".into(),
                "news_filtered_date".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub batch_capacity: usize,
    pub error_capacity: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            batch_capacity: defaults.batch_capacity,
            error_capacity: defaults.error_capacity,
        }
    }
}

impl Config {
    /// Load and validate configuration from the default path.
    ///
    /// If the file doesn't exist, a commented default is written and returned.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_config_path()?;
        if !path.exists() {
            Self::create_default_config(&path)?;
        }
        Self::load_from(&path)
    }

    /// Load and validate configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.interval_minutes) {
            return Err(ConfigError::Invalid(format!(
                "interval_minutes must be between 1 and {}, got {}",
                MAX_INTERVAL_MINUTES, self.interval_minutes
            )));
        }

        for source in &self.sources {
            url::Url::parse(source)
                .map_err(|e| ConfigError::Invalid(format!("invalid source {}: {}", source, e)))?;
        }

        if self.bus.topics.len() != TOPIC_COUNT {
            return Err(ConfigError::Invalid(format!(
                "bus.topics needs exactly {} names, got {}",
                TOPIC_COUNT,
                self.bus.topics.len()
            )));
        }
        if self.bus.topics.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("bus.topics must not contain empty names".into()));
        }

        // Every channel gets exactly one subscriber, so names must not repeat.
        let mut channels = HashSet::new();
        channels.insert(self.bus.input_channel.as_str());
        for topic in &self.bus.topics {
            if !channels.insert(topic.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "bus topic {} is used more than once (input channel included)",
                    topic
                )));
            }
        }

        self.bind_addr()?;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn source_descriptors(&self) -> Vec<SourceDescriptor> {
        self.sources
            .iter()
            .map(|url| SourceDescriptor::from_minutes(url.clone(), self.interval_minutes))
            .collect()
    }

    pub fn source_descriptors_every(&self, interval: Duration) -> Vec<SourceDescriptor> {
        self.sources
            .iter()
            .map(|url| SourceDescriptor::new(url.clone(), interval))
            .collect()
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("invalid server.bind {}: {}", self.server.bind, e)))
    }

    /// Topics in destination-index order. Only valid after [`Config::validate`].
    pub fn topics(&self) -> [String; TOPIC_COUNT] {
        std::array::from_fn(|i| self.bus.topics.get(i).cloned().unwrap_or_default())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            batch_capacity: self.pipeline.batch_capacity,
            error_capacity: self.pipeline.error_capacity,
        }
    }

    /// Get the default config file path: `~/.config/newswire/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newswire").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> &'static str {
        r##"# newswire configuration

# Feed addresses polled by the ingestion pipeline
sources = []

# Minutes between two polls of the same source
interval_minutes = 5

# SQLite file; defaults to the platform data directory
# database = "/var/lib/newswire/newswire.db"

[server]
bind = "127.0.0.1:3000"

[bus]
input_channel = "news_input"
# Destination topics in order: detail, list, filtered, filtered by date
topics = ["news_detail", "news_list", "news_filtered", "news_filtered_date"]

[pipeline]
batch_capacity = 32
error_capacity = 64
"##
    }
}

/// Suffixes understood by [`parse_interval`], largest first.
const INTERVAL_UNITS: [(char, u64); 4] = [('d', 86400), ('h', 3600), ('m', 60), ('s', 1)];

/// Parse an interval like `1h`, `30m`, `1d`, `60s` or raw seconds into seconds.
pub fn parse_interval(s: &str) -> Result<u64, String> {
    let s = s.trim().to_lowercase();

    let (digits, scale) = INTERVAL_UNITS
        .iter()
        .find_map(|&(unit, scale)| s.strip_suffix(unit).map(|d| (d, scale)))
        .unwrap_or((s.as_str(), 1));

    let count: u64 = digits
        .parse()
        .map_err(|_| format!("Invalid interval: {}. Use format like '1h', '30m', '1d'", s))?;
    count
        .checked_mul(scale)
        .ok_or_else(|| format!("Interval too large: {}", s))
}

/// [`parse_interval`] limited to what a poller accepts: non-zero, at most [`MAX_INTERVAL_MINUTES`].
pub fn parse_poll_interval(s: &str) -> Result<Duration, String> {
    let secs = parse_interval(s)?;
    if secs == 0 || secs > MAX_INTERVAL_MINUTES * 60 {
        return Err(format!(
            "Interval {} out of range, use 1s to {}",
            s.trim(),
            format_interval(MAX_INTERVAL_MINUTES * 60)
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Largest whole unit that divides `secs`, e.g. `7200` is `2h`.
pub fn format_interval(secs: u64) -> String {
    INTERVAL_UNITS
        .iter()
        .find(|&&(_, scale)| secs >= scale && secs % scale == 0)
        .map(|&(unit, scale)| format!("{}{}", secs / scale, unit))
        .unwrap_or_else(|| format!("{}s", secs))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_content_parses_and_validates() {
        let config: Config = toml::from_str(Config::default_config_content()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.interval_minutes, 5);
        assert_eq!(config.topics()[0], "news_detail");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (_dir, path) = write(r#"sources = ["https://example.com/rss"]"#);
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.bus.input_channel, "news_input");
        assert_eq!(config.pipeline_config().batch_capacity, 32);
    }

    #[test]
    fn test_full_file() {
        let (_dir, path) = write(
            r#"
sources = ["https://a.example/rss", "https://b.example/atom"]
interval_minutes = 2
database = "/tmp/news.db"

[server]
bind = "0.0.0.0:8080"

[bus]
input_channel = "in"
topics = ["t1", "t2", "t3", "t4"]

[pipeline]
batch_capacity = 8
error_capacity = 4
"#,
        );
        let config = Config::load_from(&path).unwrap();
        let sources = config.source_descriptors();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].interval, Duration::from_secs(120));
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.topics(), ["t1", "t2", "t3", "t4"].map(String::from));
        assert_eq!(config.pipeline_config().error_capacity, 4);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let (_dir, path) = write("interval_minutes = 0");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_wrong_topic_count_rejected() {
        let (_dir, path) = write("[bus]\ntopics = [\"a\", \"b\"]");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_source_rejected() {
        let (_dir, path) = write(r#"sources = ["not a url"]"#);
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let (_dir, path) = write("sources = [");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("1h"), Ok(3600));
        assert_eq!(parse_interval("30m"), Ok(1800));
        assert_eq!(parse_interval("1d"), Ok(86400));
        assert_eq!(parse_interval("60s"), Ok(60));
        assert_eq!(parse_interval(" 90 "), Ok(90));
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn test_parse_interval_overflow_is_error() {
        assert!(parse_interval("9999999999999999h").is_err());
        assert!(parse_interval("99999999999999999999").is_err());
    }

    #[test]
    fn test_parse_poll_interval_bounds() {
        assert_eq!(parse_poll_interval("30m"), Ok(Duration::from_secs(1800)));
        assert_eq!(parse_poll_interval("7d"), Ok(Duration::from_secs(604800)));
        assert!(parse_poll_interval("0s").is_err());
        assert!(parse_poll_interval("8d").is_err());
        assert!(parse_poll_interval("9999999999999999h").is_err());
    }

    #[test]
    fn test_oversized_interval_rejected() {
        let (_dir, path) = write("interval_minutes = 18446744073709551615");
        assert!(Config::load_from(&path).is_err());

        for minutes in [MAX_INTERVAL_MINUTES + 1, i64::MAX as u64] {
            let (_dir, path) = write(&format!("interval_minutes = {}", minutes));
            assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
        }

        let (_dir, path) = write(&format!("interval_minutes = {}", MAX_INTERVAL_MINUTES));
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.interval(), Duration::from_secs(604800));
        assert_eq!(config.source_descriptors().len(), 0);
    }

    #[test]
    fn test_duplicate_topics_rejected() {
        let (_dir, path) = write("[bus]\ntopics = [\"a\", \"b\", \"a\", \"d\"]");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_topic_reusing_input_channel_rejected() {
        let (_dir, path) = write("[bus]\ninput_channel = \"in\"\ntopics = [\"in\", \"b\", \"c\", \"d\"]");
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(86400), "1d");
        assert_eq!(format_interval(7200), "2h");
        assert_eq!(format_interval(300), "5m");
        assert_eq!(format_interval(45), "45s");
        assert_eq!(format_interval(0), "0s");
    }
}
