//! Offload round-trip example.
//!
//! Sends one small and one oversized message through an extended client backed
//! by in-process queue and object-store doubles, then receives and deletes
//! both. The oversized body travels through the queue as a pointer and is
//! restored on receive; deleting it also removes the stored payload.
//!
//! ```sh
//! RUST_LOG=debug cargo run --example offload_round_trip
//! ```

use std::sync::Arc;

use spillway_core::{MemoryObjectStore, ObjectPayloadStore, OffloadConfig};
use spillway_sdk::{
    ExtendedQueueClient, MemoryQueue, ReceiveMessageRequest, SendMessageRequest,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    spillway_core::telemetry::init_tracing();

    let queue = Arc::new(MemoryQueue::new());
    let objects = Arc::new(MemoryObjectStore::new());
    let store = Arc::new(ObjectPayloadStore::new(objects.clone(), "demo-payloads"));

    let config = OffloadConfig::from_toml_str("message_size_threshold = 1024")?;
    let client = ExtendedQueueClient::new(queue.clone())
        .with_config(config)?
        .with_payload_support(store);

    client.send(SendMessageRequest::new("a short note")).await?;
    client
        .send(SendMessageRequest::new("report line\n".repeat(200)))
        .await?;

    for sent in queue.sent() {
        println!("on the wire: {} bytes", sent.body.len());
    }
    println!("payloads in bucket: {}", objects.len());

    let batch = client
        .receive(ReceiveMessageRequest::new().with_max_messages(10))
        .await?;
    for entry in batch.into_entries() {
        let msg = entry?;
        println!("received {}: {} bytes", msg.id, msg.body.len());
        client.delete(&msg.receipt_handle).await?;
    }
    println!("payloads in bucket after delete: {}", objects.len());

    Ok(())
}
