use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use spillway_core::{Message, MessageAttributes};
use uuid::Uuid;

use crate::error::QueueError;
use crate::queue::{
    QueueClient, ReceiveMessageRequest, ReceiveMessageResult, SendMessageRequest,
    SendMessageResult,
};

const DEFAULT_MAX_MESSAGES: u32 = 1;
const MAX_MESSAGES_LIMIT: u32 = 10;
const RECEIVE_COUNT_ATTRIBUTE: &str = "ApproximateReceiveCount";

struct StoredMessage {
    id: String,
    body: String,
    message_attributes: MessageAttributes,
    receive_count: u32,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<StoredMessage>,
    in_flight: HashMap<String, StoredMessage>,
    sent: Vec<SendMessageRequest>,
    receive_requests: Vec<ReceiveMessageRequest>,
}

/// In-process queue with receipt-handle semantics.
///
/// Received messages move to an in-flight set until deleted or released back
/// with [`expire_in_flight`](Self::expire_in_flight). Every receive hands out a
/// fresh receipt handle, and message attributes are filtered by the requested
/// names like a real transport does.
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    unavailable: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails with [`QueueError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Requests accepted by `send`, as they reached the transport.
    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.lock().sent.clone()
    }

    /// Requests passed to `receive`, as they reached the transport.
    pub fn receive_requests(&self) -> Vec<ReceiveMessageRequest> {
        self.lock().receive_requests.clone()
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.lock().in_flight.len()
    }

    /// Return every in-flight message to the queue, as if its visibility
    /// timeout had run out. Old receipt handles stop working.
    pub fn expire_in_flight(&self) {
        let mut state = self.lock();
        let expired: Vec<StoredMessage> = state.in_flight.drain().map(|(_, msg)| msg).collect();
        state.pending.extend(expired);
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::Unavailable("memory queue switched off".to_string()));
        }
        Ok(())
    }
}

fn wants(names: &[String], name: &str) -> bool {
    names.iter().any(|n| n == "All" || n == ".*" || n == name)
}

fn filter_attributes(attributes: &MessageAttributes, names: &[String]) -> MessageAttributes {
    attributes
        .iter()
        .filter(|(name, _)| wants(names, name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl QueueClient for MemoryQueue {
    async fn send(&self, request: SendMessageRequest) -> Result<SendMessageResult, QueueError> {
        self.check_available()?;
        let id = Uuid::now_v7().to_string();
        let mut state = self.lock();
        state.pending.push_back(StoredMessage {
            id: id.clone(),
            body: request.body.clone(),
            message_attributes: request.message_attributes.clone(),
            receive_count: 0,
        });
        state.sent.push(request);
        Ok(SendMessageResult { message_id: id })
    }

    async fn receive(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResult, QueueError> {
        self.check_available()?;
        let max = request.max_messages.unwrap_or(DEFAULT_MAX_MESSAGES);
        if max == 0 || max > MAX_MESSAGES_LIMIT {
            return Err(QueueError::InvalidArgument(format!(
                "max_messages must be between 1 and {MAX_MESSAGES_LIMIT}, got {max}"
            )));
        }

        let mut state = self.lock();
        let mut messages = Vec::new();
        while messages.len() < max as usize {
            let Some(mut stored) = state.pending.pop_front() else {
                break;
            };
            stored.receive_count += 1;

            let mut attributes = HashMap::new();
            if wants(&request.attribute_names, RECEIVE_COUNT_ATTRIBUTE) {
                attributes.insert(
                    RECEIVE_COUNT_ATTRIBUTE.to_string(),
                    stored.receive_count.to_string(),
                );
            }
            let receipt_handle = Uuid::now_v7().to_string();
            messages.push(Message {
                id: stored.id.clone(),
                receipt_handle: receipt_handle.clone(),
                body: stored.body.clone(),
                attributes,
                message_attributes: filter_attributes(
                    &stored.message_attributes,
                    &request.message_attribute_names,
                ),
            });
            state.in_flight.insert(receipt_handle, stored);
        }
        state.receive_requests.push(request);

        Ok(ReceiveMessageResult { messages })
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        self.check_available()?;
        match self.lock().in_flight.remove(receipt_handle) {
            Some(_) => Ok(()),
            None => Err(QueueError::ReceiptHandleNotFound(receipt_handle.to_string())),
        }
    }
}
