use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use spillway_core::{
    message_attributes_size, ConfigError, Message, MessageAttributeValue, MessageAttributes,
    OffloadConfig, PayloadError, PayloadPointer, PayloadStore, RESERVED_ATTRIBUTE_NAME,
};
use tracing::{debug, warn};

use crate::error::{
    DeleteError, MessageFailure, QueueError, ReceiveError, ResolveError, SendError,
};
use crate::queue::{QueueClient, ReceiveMessageRequest, SendMessageRequest, SendMessageResult};

/// Messages of one receive call, in transport order. Each entry is either the
/// message with its original body restored or the failure that prevented it.
#[derive(Debug, Default)]
pub struct ReceiveBatch {
    entries: Vec<Result<Message, MessageFailure>>,
}

impl ReceiveBatch {
    pub fn entries(&self) -> &[Result<Message, MessageFailure>] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Result<Message, MessageFailure>> {
        self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| entry.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &MessageFailure> {
        self.entries.iter().filter_map(|entry| entry.as_ref().err())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Receipt handles of received offloaded messages and the payloads they point
/// to. A pointer is held by at most one handle: the latest delivery of its
/// message.
#[derive(Debug, Default)]
struct TrackedPayloads {
    by_handle: HashMap<String, PayloadPointer>,
    by_pointer: HashMap<PayloadPointer, String>,
}

impl TrackedPayloads {
    fn insert(&mut self, receipt_handle: String, pointer: PayloadPointer) {
        if let Some(previous) = self
            .by_pointer
            .insert(pointer.clone(), receipt_handle.clone())
        {
            if previous != receipt_handle {
                self.by_handle.remove(&previous);
            }
        }
        if let Some(replaced) = self.by_handle.insert(receipt_handle.clone(), pointer.clone()) {
            if replaced != pointer
                && self.by_pointer.get(&replaced) == Some(&receipt_handle)
            {
                self.by_pointer.remove(&replaced);
            }
        }
    }

    fn remove(&mut self, receipt_handle: &str) -> Option<PayloadPointer> {
        let pointer = self.by_handle.remove(receipt_handle)?;
        if self
            .by_pointer
            .get(&pointer)
            .is_some_and(|handle| handle == receipt_handle)
        {
            self.by_pointer.remove(&pointer);
        }
        Some(pointer)
    }

    fn get(&self, receipt_handle: &str) -> Option<&PayloadPointer> {
        self.by_handle.get(receipt_handle)
    }

    fn len(&self) -> usize {
        self.by_handle.len()
    }
}

/// Queue client that moves oversized message bodies into a [`PayloadStore`].
///
/// Wraps any [`QueueClient`]. Until a payload store is configured every call is
/// forwarded unchanged. With a store, `send` replaces bodies larger than the
/// size threshold with a serialized [`PayloadPointer`] and tags the message
/// with the [`RESERVED_ATTRIBUTE_NAME`] attribute; `receive` reverses that.
///
/// The client can be shared across tasks. Its only mutable state is the
/// receipt handle to pointer table used for cleanup on delete. An entry lives
/// from the receive that produced it until the handle is deleted, expires at
/// the queue, is superseded by a redelivery of the same message, or is
/// released with [`forget`](Self::forget).
pub struct ExtendedQueueClient<Q> {
    inner: Q,
    payload_store: Option<Arc<dyn PayloadStore>>,
    config: OffloadConfig,
    tracked: Mutex<TrackedPayloads>,
}

impl<Q: QueueClient> ExtendedQueueClient<Q> {
    /// Wrap `inner` with payload support disabled.
    pub fn new(inner: Q) -> Self {
        Self {
            inner,
            payload_store: None,
            config: OffloadConfig::default(),
            tracked: Mutex::new(TrackedPayloads::default()),
        }
    }

    /// Enable payload offloading through `store`.
    ///
    /// Whether deleting a message also deletes its offloaded payload is
    /// [`OffloadConfig::cleanup_payload`], on by default.
    pub fn with_payload_support(mut self, store: Arc<dyn PayloadStore>) -> Self {
        self.payload_store = Some(store);
        self
    }

    /// Validate and apply the offloading settings.
    pub fn with_config(mut self, config: OffloadConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn is_payload_support_enabled(&self) -> bool {
        self.payload_store.is_some()
    }

    pub fn config(&self) -> &OffloadConfig {
        &self.config
    }

    pub fn inner(&self) -> &Q {
        &self.inner
    }

    /// Pointer of the offloaded payload received under `receipt_handle` that
    /// will be cleaned up when the message is deleted.
    pub fn tracked_pointer(&self, receipt_handle: &str) -> Option<PayloadPointer> {
        self.tracked_lock().get(receipt_handle).cloned()
    }

    /// Number of receipt handles whose payload is awaiting cleanup.
    pub fn tracked_len(&self) -> usize {
        self.tracked_lock().len()
    }

    /// Stop tracking `receipt_handle` without deleting anything, for callers
    /// that release a message back to the queue instead of deleting it. A later
    /// redelivery tracks the payload again under its new handle.
    pub fn forget(&self, receipt_handle: &str) -> Option<PayloadPointer> {
        self.tracked_lock().remove(receipt_handle)
    }

    /// Send a message, offloading its body when body plus attributes exceed
    /// the size threshold.
    ///
    /// Attribute constraints are checked before anything is written, so a
    /// rejected request leaves no trace in the store or the queue.
    pub async fn send(&self, request: SendMessageRequest) -> Result<SendMessageResult, SendError> {
        let Some(store) = &self.payload_store else {
            return Ok(self.inner.send(request).await?);
        };

        self.check_message_attributes(&request.message_attributes)?;

        if !self.is_large(&request) {
            return Ok(self.inner.send(request).await?);
        }

        let (request, pointer) = self.store_message_payload(store.as_ref(), request).await?;
        match self.inner.send(request).await {
            Ok(result) => {
                debug!(
                    message_id = %result.message_id,
                    %pointer,
                    "sent message with offloaded payload"
                );
                Ok(result)
            }
            Err(e) => {
                // The message never reached the queue, so nothing references the payload.
                if let Err(cleanup) = store.delete(&pointer).await {
                    warn!(%pointer, error = %cleanup, "failed to remove payload of unsent message");
                }
                Err(e.into())
            }
        }
    }

    /// Receive a batch and restore the original body of every offloaded message.
    ///
    /// Payloads are fetched concurrently. A message whose payload cannot be
    /// resolved is reported as a [`MessageFailure`] in its slot of the batch and
    /// does not affect the others. Dropping the returned future cancels all
    /// in-flight fetches; nothing partially resolved is handed out.
    pub async fn receive(
        &self,
        mut request: ReceiveMessageRequest,
    ) -> Result<ReceiveBatch, ReceiveError> {
        let Some(store) = &self.payload_store else {
            let result = self.inner.receive(request).await?;
            return Ok(ReceiveBatch {
                entries: result.messages.into_iter().map(Ok).collect(),
            });
        };

        if !request
            .message_attribute_names
            .iter()
            .any(|name| name == RESERVED_ATTRIBUTE_NAME)
        {
            request
                .message_attribute_names
                .push(RESERVED_ATTRIBUTE_NAME.to_string());
        }

        let result = self.inner.receive(request).await?;
        let entries = join_all(
            result
                .messages
                .into_iter()
                .map(|message| self.rehydrate(store.as_ref(), message)),
        )
        .await;

        Ok(ReceiveBatch { entries })
    }

    /// Delete a message, and with cleanup enabled the payload it pointed to.
    ///
    /// The queue delete happens first: if it fails the payload is untouched
    /// and the message stays fully resolvable. A payload that is already gone
    /// counts as cleaned up. A handle the queue no longer knows is dropped from
    /// tracking; the payload stays for the message's next delivery.
    pub async fn delete(&self, receipt_handle: &str) -> Result<(), DeleteError> {
        if let Err(e) = self.inner.delete(receipt_handle).await {
            if matches!(e, QueueError::ReceiptHandleNotFound(_)) {
                let expired = self.tracked_lock().remove(receipt_handle);
                if let Some(pointer) = expired {
                    debug!(%pointer, "stopped tracking expired receipt handle");
                }
            }
            return Err(e.into());
        }

        let Some(store) = &self.payload_store else {
            return Ok(());
        };
        if !self.config.cleanup_payload {
            return Ok(());
        }
        let tracked = self.tracked_lock().remove(receipt_handle);
        let Some(pointer) = tracked else {
            return Ok(());
        };

        match store.delete(&pointer).await {
            Ok(()) => {
                debug!(%pointer, "deleted offloaded payload");
                Ok(())
            }
            Err(PayloadError::NotFound(_)) => {
                debug!(%pointer, "offloaded payload already removed");
                Ok(())
            }
            Err(source) => Err(DeleteError::PayloadCleanup { pointer, source }),
        }
    }

    fn check_message_attributes(&self, attributes: &MessageAttributes) -> Result<(), SendError> {
        let threshold = self.config.message_size_threshold;
        let size = message_attributes_size(attributes);
        if size > threshold {
            return Err(SendError::InvalidArgument(format!(
                "total size of message attributes is {size} bytes which is larger than the threshold of {threshold} bytes; consider including the payload in the message body instead"
            )));
        }

        let count = attributes.len();
        let max = self.config.max_caller_attributes();
        if count > max {
            return Err(SendError::InvalidArgument(format!(
                "number of message attributes [{count}] exceeds the maximum allowed for large-payload messages [{max}]"
            )));
        }

        if attributes.contains_key(RESERVED_ATTRIBUTE_NAME) {
            return Err(SendError::InvalidArgument(format!(
                "message attribute name {RESERVED_ATTRIBUTE_NAME} is reserved for use by the extended client"
            )));
        }

        Ok(())
    }

    fn is_large(&self, request: &SendMessageRequest) -> bool {
        let total = message_attributes_size(&request.message_attributes) + request.body.len();
        total > self.config.message_size_threshold
    }

    async fn store_message_payload(
        &self,
        store: &dyn PayloadStore,
        mut request: SendMessageRequest,
    ) -> Result<(SendMessageRequest, PayloadPointer), SendError> {
        let size = request.body.len();
        let pointer = store.store(request.body.as_bytes(), None).await?;

        request.message_attributes.insert(
            RESERVED_ATTRIBUTE_NAME.to_string(),
            MessageAttributeValue::number(size),
        );
        request.body = pointer.serialize();
        debug!(%pointer, size, "offloaded message payload");

        Ok((request, pointer))
    }

    async fn rehydrate(
        &self,
        store: &dyn PayloadStore,
        mut message: Message,
    ) -> Result<Message, MessageFailure> {
        let Some(marker) = message.message_attributes.remove(RESERVED_ATTRIBUTE_NAME) else {
            return Ok(message);
        };

        match self.resolve_payload(store, &message, &marker).await {
            Ok(body) => {
                message.body = body;
                Ok(message)
            }
            Err(error) => {
                warn!(message_id = %message.id, %error, "failed to resolve offloaded payload");
                Err(MessageFailure {
                    message_id: message.id,
                    receipt_handle: message.receipt_handle,
                    error,
                })
            }
        }
    }

    async fn resolve_payload(
        &self,
        store: &dyn PayloadStore,
        message: &Message,
        marker: &MessageAttributeValue,
    ) -> Result<String, ResolveError> {
        let pointer = store.parse_pointer(&message.body)?;
        if self.config.cleanup_payload {
            self.tracked_lock()
                .insert(message.receipt_handle.clone(), pointer.clone());
        }

        let payload = match self.config.fetch_timeout() {
            Some(limit) => tokio::time::timeout(limit, store.fetch(&pointer))
                .await
                .map_err(|_| ResolveError::TimedOut(limit))??,
            None => store.fetch(&pointer).await?,
        };

        let declared = marker.as_str().and_then(|v| v.parse::<usize>().ok());
        if declared != Some(payload.len()) {
            warn!(
                message_id = %message.id,
                %pointer,
                declared = ?declared,
                actual = payload.len(),
                "offloaded payload size differs from marker"
            );
        }
        debug!(
            message_id = %message.id,
            %pointer,
            size = payload.len(),
            "resolved offloaded payload"
        );

        Ok(String::from_utf8(payload)?)
    }

    fn tracked_lock(&self) -> MutexGuard<'_, TrackedPayloads> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
