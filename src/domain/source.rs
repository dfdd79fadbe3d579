use std::time::Duration;

/// One configured feed and how often to poll it. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub url: String,
    pub interval: Duration,
}

impl SourceDescriptor {
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            url: url.into(),
            interval,
        }
    }

    pub fn from_minutes(url: impl Into<String>, minutes: u64) -> Self {
        Self::new(url, Duration::from_secs(minutes.saturating_mul(60)))
    }
}
