mod helpers;

use std::collections::HashSet;
use std::sync::Arc;

use helpers::{attributes, MemoryHarness, ObjectHarness, BUCKET};
use spillway_core::{
    MessageAttributeValue, OffloadConfig, PayloadError, PayloadPointer, RESERVED_ATTRIBUTE_NAME,
};
use spillway_sdk::{QueueError, SendError, SendMessageRequest};

#[tokio::test]
async fn oversized_body_is_offloaded() {
    let h = ObjectHarness::with_threshold(10);

    h.client
        .send(SendMessageRequest::new("hello world"))
        .await
        .unwrap();

    let sent = h.queue.sent();
    assert_eq!(sent.len(), 1);
    let pointer = PayloadPointer::parse(&sent[0].body).unwrap();
    assert_eq!(pointer.store_id(), BUCKET);
    assert_eq!(sent[0].body, pointer.serialize());
    assert_eq!(
        h.objects.object(BUCKET, pointer.key()).as_deref(),
        Some(&b"hello world"[..])
    );
    assert_eq!(
        sent[0].message_attributes.get(RESERVED_ATTRIBUTE_NAME),
        Some(&MessageAttributeValue::number(11))
    );
    assert_eq!(h.objects.put_count(), 1);
}

#[tokio::test]
async fn small_body_is_sent_unchanged() {
    let h = MemoryHarness::with_threshold(10);

    h.client.send(SendMessageRequest::new("hi")).await.unwrap();

    assert_eq!(h.store.store_count(), 0);
    let sent = h.queue.sent();
    assert_eq!(sent, vec![SendMessageRequest::new("hi")]);
}

#[tokio::test]
async fn threshold_is_inclusive() {
    let h = MemoryHarness::with_threshold(10);

    h.client
        .send(SendMessageRequest::new("0123456789"))
        .await
        .unwrap();
    assert_eq!(h.store.store_count(), 0, "exactly at threshold stays inline");

    h.client
        .send(SendMessageRequest::new("0123456789a"))
        .await
        .unwrap();
    assert_eq!(h.store.store_count(), 1, "one byte over is offloaded");
}

#[tokio::test]
async fn attributes_count_toward_message_size() {
    let h = MemoryHarness::with_threshold(10);
    let request = SendMessageRequest::new("body")
        .with_attribute("trace", MessageAttributeValue::string("abc"));

    h.client.send(request).await.unwrap();

    assert_eq!(h.store.store_count(), 1);
    let sent = &h.queue.sent()[0];
    assert_eq!(
        sent.message_attributes.get("trace"),
        Some(&MessageAttributeValue::string("abc")),
        "caller attributes travel with the pointer"
    );
    assert_eq!(
        sent.message_attributes.get(RESERVED_ATTRIBUTE_NAME),
        Some(&MessageAttributeValue::number(4))
    );
}

#[tokio::test]
async fn body_size_is_measured_in_utf8_bytes() {
    let h = MemoryHarness::with_threshold(10);

    // five two-byte characters: 10 bytes
    h.client
        .send(SendMessageRequest::new("ééééé"))
        .await
        .unwrap();
    assert_eq!(h.store.store_count(), 0);

    h.client
        .send(SendMessageRequest::new("éééééé"))
        .await
        .unwrap();
    assert_eq!(h.store.store_count(), 1);
    assert_eq!(
        h.queue.sent()[1].message_attributes[RESERVED_ATTRIBUTE_NAME],
        MessageAttributeValue::number(12)
    );
}

#[tokio::test]
async fn oversized_attributes_are_rejected_before_any_call() {
    let h = MemoryHarness::with_threshold(10);
    let request =
        SendMessageRequest::new("x").with_attribute("name", MessageAttributeValue::string("1234567"));

    let err = h.client.send(request).await.unwrap_err();

    assert!(matches!(err, SendError::InvalidArgument(_)), "got {err:?}");
    assert_eq!(h.store.store_count(), 0);
    assert!(h.queue.sent().is_empty());
}

#[tokio::test]
async fn reserved_attribute_name_is_rejected() {
    let h = MemoryHarness::with_threshold(1024);
    let request = SendMessageRequest::new("x")
        .with_attribute(RESERVED_ATTRIBUTE_NAME, MessageAttributeValue::number(1));

    let err = h.client.send(request).await.unwrap_err();

    assert!(matches!(err, SendError::InvalidArgument(_)), "got {err:?}");
    assert!(err.to_string().contains(RESERVED_ATTRIBUTE_NAME));
    assert!(h.queue.sent().is_empty());
}

#[tokio::test]
async fn attribute_count_leaves_room_for_marker() {
    let h = MemoryHarness::with_threshold(1024);

    let mut at_limit = SendMessageRequest::new("x".repeat(2000));
    at_limit.message_attributes = attributes(10);
    let err = h.client.send(at_limit).await.unwrap_err();
    assert!(matches!(err, SendError::InvalidArgument(_)), "got {err:?}");
    assert_eq!(h.store.store_count(), 0);

    let mut below_limit = SendMessageRequest::new("x".repeat(2000));
    below_limit.message_attributes = attributes(9);
    h.client.send(below_limit).await.unwrap();
    assert_eq!(h.store.store_count(), 1);
    assert_eq!(h.queue.sent()[0].message_attributes.len(), 10);
}

#[tokio::test]
async fn store_failure_aborts_send() {
    let h = ObjectHarness::with_threshold(10);
    h.objects.set_unavailable(true);

    let err = h
        .client
        .send(SendMessageRequest::new("hello world"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, SendError::Payload(PayloadError::StoreUnavailable(_))),
        "got {err:?}"
    );
    assert!(h.queue.sent().is_empty());
}

#[tokio::test]
async fn queue_failure_removes_stored_payload() {
    let h = ObjectHarness::with_threshold(10);
    h.queue.set_unavailable(true);

    let err = h
        .client
        .send(SendMessageRequest::new("hello world"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, SendError::Queue(QueueError::Unavailable(_))),
        "got {err:?}"
    );
    assert_eq!(h.objects.put_count(), 1);
    assert!(h.objects.is_empty(), "payload of the unsent message is removed");
}

#[tokio::test]
async fn default_threshold_is_256_kib() {
    let h = ObjectHarness::with_config(OffloadConfig::default());

    h.client
        .send(SendMessageRequest::new("a".repeat(256 * 1024)))
        .await
        .unwrap();
    assert_eq!(h.objects.put_count(), 0);

    h.client
        .send(SendMessageRequest::new("a".repeat(256 * 1024 + 1)))
        .await
        .unwrap();
    assert_eq!(h.objects.put_count(), 1);
}

#[tokio::test]
async fn concurrent_sends_get_distinct_keys() {
    let h = ObjectHarness::with_threshold(4);
    let client = Arc::new(h.client);

    let mut handles = Vec::new();
    for i in 0..32 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .send(SendMessageRequest::new(format!("payload number {i}")))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let keys: HashSet<String> = h
        .queue
        .sent()
        .iter()
        .map(|req| PayloadPointer::parse(&req.body).unwrap().key().to_string())
        .collect();
    assert_eq!(keys.len(), 32);
    assert_eq!(h.objects.len(), 32);
}
