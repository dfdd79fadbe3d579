//! Bus-to-query bridge.
//!
//! Each inbound message carries an API path. The bridge queries that path and
//! republishes the raw response body to the topic of the matching [`Route`].
//! It only reads from the store, through the query API.

pub mod bus;
pub mod client;
pub mod route;

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::TOPIC_COUNT;

pub use bus::{BusConsumer, BusMessage, BusProducer, ChannelBus, ChannelConsumer};
pub use client::{HttpQueryClient, QueryClient, QueryResponse, RouterClient};
pub use route::Route;

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Republished { route: Route, topic: String },
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    QueryFailed,
    Unmatched,
    PublishFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeReport {
    pub received: u64,
    pub republished: u64,
    pub dropped: u64,
}

pub struct Bridge {
    consumer: Box<dyn BusConsumer + Send>,
    dispatch: Dispatch,
}

/// Everything [`Bridge::handle`] touches. Kept apart from the consumer so a
/// running bridge only shares `Sync` state across its awaits.
struct Dispatch {
    producer: Arc<dyn BusProducer + Send + Sync>,
    client: Arc<dyn QueryClient + Send + Sync>,
    topics: [String; TOPIC_COUNT],
}

impl Bridge {
    /// `topics[i]` receives responses for the route with destination index `i + 1`.
    pub fn new(
        consumer: Box<dyn BusConsumer + Send>,
        producer: Arc<dyn BusProducer + Send + Sync>,
        client: Arc<dyn QueryClient + Send + Sync>,
        topics: [String; TOPIC_COUNT],
    ) -> Self {
        Self {
            consumer,
            dispatch: Dispatch {
                producer,
                client,
                topics,
            },
        }
    }

    pub fn topic_for(&self, route: Route) -> &str {
        self.dispatch.topic_for(route)
    }

    /// Query `path`, then republish the body if the path matches a route.
    pub async fn handle(&self, path: &str) -> Outcome {
        self.dispatch.handle(path).await
    }

    /// Process messages until the consumer closes or `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> BridgeReport {
        let Bridge {
            mut consumer,
            dispatch,
        } = self;
        let mut report = BridgeReport::default();

        while !*shutdown.borrow() {
            let message = tokio::select! {
                _ = shutdown.changed() => break,
                message = consumer.recv() => message,
            };
            let Some(message) = message else {
                tracing::info!("bridge input closed");
                break;
            };

            report.received += 1;
            let path = String::from_utf8_lossy(&message.payload).trim().to_string();
            match dispatch.handle(&path).await {
                Outcome::Republished { .. } => report.republished += 1,
                Outcome::Dropped(_) => report.dropped += 1,
            }
        }

        tracing::info!(?report, "bridge stopped");
        report
    }
}

impl Dispatch {
    fn topic_for(&self, route: Route) -> &str {
        &self.topics[route.destination() - 1]
    }

    async fn handle(&self, path: &str) -> Outcome {
        let response = match self.client.get(path).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(path, error = %e, "bridged query failed");
                return Outcome::Dropped(DropReason::QueryFailed);
            }
        };

        if !response.is_success() {
            tracing::warn!(path, status = response.status, "bridged query returned an error status");
        }

        let Some(route) = Route::classify(path) else {
            tracing::debug!(path, "no route for path, dropping response");
            return Outcome::Dropped(DropReason::Unmatched);
        };

        let topic = self.topic_for(route).to_string();
        let size = response.body.len();
        match self.producer.publish(&topic, response.body).await {
            Ok(()) => {
                tracing::debug!(path, topic = %topic, bytes = size, "republished");
                Outcome::Republished { route, topic }
            }
            Err(e) => {
                tracing::error!(path, topic = %topic, error = %e, "republish failed");
                Outcome::Dropped(DropReason::PublishFailed)
            }
        }
    }
}
