use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::app::{NewswireError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[async_trait]
pub trait BusConsumer {
    /// Next message, or `None` once the subscription is closed.
    async fn recv(&mut self) -> Option<BusMessage>;
}

#[async_trait]
pub trait BusProducer {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
}

struct Topic {
    sender: mpsc::Sender<Vec<u8>>,
    receiver: Option<mpsc::Receiver<Vec<u8>>>,
}

/// In-process bus: one bounded queue per topic, one subscriber per topic.
///
/// Publishing never waits; a full or abandoned topic is a publish error.
pub struct ChannelBus {
    capacity: usize,
    topics: Mutex<HashMap<String, Topic>>,
}

impl ChannelBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    fn with_topic<T>(&self, name: &str, f: impl FnOnce(&mut Topic) -> T) -> Result<T> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|e| NewswireError::Bus(format!("bus lock poisoned: {}", e)))?;
        let capacity = self.capacity;
        let topic = topics.entry(name.to_string()).or_insert_with(|| {
            let (sender, receiver) = mpsc::channel(capacity);
            Topic {
                sender,
                receiver: Some(receiver),
            }
        });
        Ok(f(topic))
    }

    /// Take the single subscription for `topic`.
    pub fn subscribe(&self, topic: &str) -> Result<ChannelConsumer> {
        let receiver = self
            .with_topic(topic, |t| t.receiver.take())?
            .ok_or_else(|| NewswireError::Bus(format!("topic {} already has a subscriber", topic)))?;
        Ok(ChannelConsumer {
            topic: topic.to_string(),
            receiver,
        })
    }

    /// Drop the bus side of `topic`; its subscriber ends after draining.
    pub fn close(&self, topic: &str) -> Result<()> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|e| NewswireError::Bus(format!("bus lock poisoned: {}", e)))?;
        topics.remove(topic);
        Ok(())
    }
}

#[async_trait]
impl BusProducer for ChannelBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let sender = self.with_topic(topic, |t| t.sender.clone())?;
        sender.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => NewswireError::Bus(format!("topic {} is full", topic)),
            TrySendError::Closed(_) => NewswireError::Bus(format!("topic {} has no subscriber", topic)),
        })
    }
}

pub struct ChannelConsumer {
    topic: String,
    receiver: mpsc::Receiver<Vec<u8>>,
}

#[async_trait]
impl BusConsumer for ChannelConsumer {
    async fn recv(&mut self) -> Option<BusMessage> {
        let payload = self.receiver.recv().await?;
        Some(BusMessage {
            topic: self.topic.clone(),
            payload,
        })
    }
}
