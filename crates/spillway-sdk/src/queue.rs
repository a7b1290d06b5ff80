use std::sync::Arc;

use async_trait::async_trait;
use spillway_core::{Message, MessageAttributeValue, MessageAttributes};

use crate::error::QueueError;

/// A message to put on the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub body: String,
    pub message_attributes: MessageAttributes,
}

impl SendMessageRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            message_attributes: MessageAttributes::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: MessageAttributeValue) -> Self {
        self.message_attributes.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessageResult {
    pub message_id: String,
}

/// Parameters of a receive call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageRequest {
    /// Upper bound on the batch size; the transport picks its default when unset.
    pub max_messages: Option<u32>,
    /// Transport attributes to return with each message.
    pub attribute_names: Vec<String>,
    /// Message attributes to return with each message. `All` or `.*` selects every attribute.
    pub message_attribute_names: Vec<String>,
}

impl ReceiveMessageRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_messages(mut self, max_messages: u32) -> Self {
        self.max_messages = Some(max_messages);
        self
    }

    pub fn with_message_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.message_attribute_names.push(name.into());
        self
    }

    pub fn with_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_names.push(name.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiveMessageResult {
    pub messages: Vec<Message>,
}

/// The queue operations the extended client builds on.
///
/// Implementations own transport, retries and authentication; the extended
/// client only rewrites requests and results around these three calls.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn send(&self, request: SendMessageRequest) -> Result<SendMessageResult, QueueError>;

    async fn receive(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResult, QueueError>;

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError>;
}

#[async_trait]
impl<T: QueueClient + ?Sized> QueueClient for Arc<T> {
    async fn send(&self, request: SendMessageRequest) -> Result<SendMessageResult, QueueError> {
        (**self).send(request).await
    }

    async fn receive(
        &self,
        request: ReceiveMessageRequest,
    ) -> Result<ReceiveMessageResult, QueueError> {
        (**self).receive(request).await
    }

    async fn delete(&self, receipt_handle: &str) -> Result<(), QueueError> {
        (**self).delete(receipt_handle).await
    }
}
