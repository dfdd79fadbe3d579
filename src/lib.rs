//! # newswire
//!
//! Polls RSS/Atom sources, stores articles in SQLite, and serves them through
//! a small query API that is also reachable from a message bus.
//!
//! ## Architecture
//!
//! ```text
//! FeedPoller x N → IngestionWriter → ArticleStore ← query ← HTTP API
//!                                                         ← Bridge ← bus
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Poll every configured source once
//! newswire update
//!
//! # Ten most recent articles
//! newswire list -n 10
//!
//! # Run pollers, API and bridge
//! newswire serve
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the store,
/// fetcher, normalizer and configuration.
pub mod app;

/// Bus-driven access to the query API.
///
/// - [`Route`](bridge::Route): path pattern to destination topic
/// - [`Bridge`](bridge::Bridge): receive, query, republish loop
/// - [`ChannelBus`](bridge::ChannelBus): in-process bus
pub mod bridge;

/// HTTP routes over the query engine, built with axum.
pub mod api;

/// Command-line interface using clap.
///
/// - `serve` - Run pollers, API and bridge
/// - `update` - Poll every source once
/// - `list [-n N] [--page P]` - Recent articles
/// - `search <TEXT> [--page P]` - Content search
pub mod cli;

/// TOML configuration, loaded from `~/.config/newswire/config.toml` by default.
pub mod config;

/// Core domain models: [`Article`](domain::Article), [`PageEnvelope`](domain::PageEnvelope)
/// and [`SourceDescriptor`](domain::SourceDescriptor).
pub mod domain;

/// HTTP fetching with conditional request support.
pub mod fetcher;

/// Feed parsing and normalization into articles.
pub mod normalizer;

/// Poller, writer and error sink tasks plus their owning [`Pipeline`](pipeline::Pipeline).
pub mod pipeline;

/// Validated, paginated reads.
pub mod query;

/// SQLite persistence layer.
///
/// - [`ArticleStore`](store::ArticleStore): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
