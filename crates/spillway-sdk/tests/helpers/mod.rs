#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use spillway_core::{
    MemoryObjectStore, MemoryPayloadStore, MessageAttributeValue, MessageAttributes,
    ObjectPayloadStore, OffloadConfig, PayloadPointer, PayloadResult, PayloadStore,
    RESERVED_ATTRIBUTE_NAME,
};
use spillway_sdk::{
    ExtendedQueueClient, MemoryQueue, QueueClient, ReceiveMessageRequest, SendMessageRequest,
};

pub const BUCKET: &str = "extended-payloads";

pub type TestClient = ExtendedQueueClient<Arc<MemoryQueue>>;

/// Extended client over a [`MemoryQueue`] and an object-store backed payload store.
pub struct ObjectHarness {
    pub client: TestClient,
    pub queue: Arc<MemoryQueue>,
    pub objects: Arc<MemoryObjectStore>,
}

impl ObjectHarness {
    /// Cleanup enabled, every other setting at its default except the threshold.
    pub fn with_threshold(threshold: usize) -> Self {
        Self::with_config(OffloadConfig {
            message_size_threshold: threshold,
            ..OffloadConfig::default()
        })
    }

    pub fn with_config(config: OffloadConfig) -> Self {
        spillway_core::telemetry::init_tracing();
        let queue = Arc::new(MemoryQueue::new());
        let objects = Arc::new(MemoryObjectStore::new());
        let store = Arc::new(ObjectPayloadStore::new(objects.clone(), BUCKET));
        let client = ExtendedQueueClient::new(queue.clone())
            .with_config(config)
            .unwrap()
            .with_payload_support(store);
        Self {
            client,
            queue,
            objects,
        }
    }

    /// Put a payload straight into the bucket and return its pointer.
    pub async fn put_payload(&self, key: &str, payload: &[u8]) -> PayloadPointer {
        use spillway_core::ObjectStore;
        self.objects
            .put_object(BUCKET, key, payload.to_vec())
            .await
            .unwrap();
        PayloadPointer::object(BUCKET, key).unwrap()
    }
}

/// Extended client over a [`MemoryQueue`] and a call-counting in-memory payload store.
pub struct MemoryHarness {
    pub client: TestClient,
    pub queue: Arc<MemoryQueue>,
    pub store: Arc<MemoryPayloadStore>,
}

impl MemoryHarness {
    pub fn with_threshold(threshold: usize) -> Self {
        spillway_core::telemetry::init_tracing();
        let queue = Arc::new(MemoryQueue::new());
        let store = Arc::new(MemoryPayloadStore::new("test-store"));
        let config = OffloadConfig {
            message_size_threshold: threshold,
            ..OffloadConfig::default()
        };
        let client = ExtendedQueueClient::new(queue.clone())
            .with_config(config)
            .unwrap()
            .with_payload_support(store.clone());
        Self {
            client,
            queue,
            store,
        }
    }
}

/// `count` string attributes named `attr_0..` with one-byte values.
pub fn attributes(count: usize) -> MessageAttributes {
    (0..count)
        .map(|i| (format!("attr_{i}"), MessageAttributeValue::string("v")))
        .collect()
}

/// Receive request for a full batch with every message attribute returned.
pub fn receive_all() -> ReceiveMessageRequest {
    ReceiveMessageRequest::new()
        .with_max_messages(10)
        .with_message_attribute_name("All")
}

/// Place a message on the raw queue that claims to be offloaded: body is the
/// given text, marker attribute carries `declared_size`.
pub async fn send_marked(queue: &MemoryQueue, body: impl Into<String>, declared_size: usize) {
    queue
        .send(SendMessageRequest::new(body).with_attribute(
            RESERVED_ATTRIBUTE_NAME,
            MessageAttributeValue::number(declared_size),
        ))
        .await
        .unwrap();
}

/// Payload store whose fetches of one key never complete in time.
pub struct StallingPayloadStore {
    pub inner: MemoryPayloadStore,
    pub stalled_key: String,
    pub stall: Duration,
}

#[async_trait]
impl PayloadStore for StallingPayloadStore {
    async fn store(&self, payload: &[u8], key: Option<&str>) -> PayloadResult<PayloadPointer> {
        self.inner.store(payload, key).await
    }

    async fn fetch(&self, pointer: &PayloadPointer) -> PayloadResult<Vec<u8>> {
        if pointer.key() == self.stalled_key {
            tokio::time::sleep(self.stall).await;
        }
        self.inner.fetch(pointer).await
    }

    async fn delete(&self, pointer: &PayloadPointer) -> PayloadResult<()> {
        self.inner.delete(pointer).await
    }

    fn parse_pointer(&self, raw: &str) -> PayloadResult<PayloadPointer> {
        self.inner.parse_pointer(raw)
    }
}
