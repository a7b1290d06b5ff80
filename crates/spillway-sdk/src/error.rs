use std::string::FromUtf8Error;
use std::time::Duration;

use spillway_core::{PayloadError, PayloadPointer};

/// Errors reported by the wrapped queue transport.
///
/// Analogous to `PayloadError` on the store side: the infrastructure error that
/// every per-operation type embeds via `#[from]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("queue unavailable: {0}")]
    Unavailable(String),

    #[error("receipt handle not found: {0}")]
    ReceiptHandleNotFound(String),
}

// --- Per-operation error types ---

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The request breaks a constraint of the extended client. Raised before
    /// any store or queue call.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Whole-batch receive failure. Failures of single messages are reported in
/// the batch instead, see [`MessageFailure`].
#[derive(Debug, thiserror::Error)]
pub enum ReceiveError {
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Why an offloaded payload could not be put back into its message.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("payload is not valid UTF-8: {0}")]
    NotUtf8(#[from] FromUtf8Error),

    #[error("payload fetch cancelled after {0:?}")]
    TimedOut(Duration),
}

/// A received message whose payload could not be resolved. The receipt handle
/// is kept so the caller can still delete or release the message.
#[derive(Debug, thiserror::Error)]
#[error("message {message_id}: {error}")]
pub struct MessageFailure {
    pub message_id: String,
    pub receipt_handle: String,
    #[source]
    pub error: ResolveError,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// The message is gone from the queue but its payload is still stored.
    #[error("message deleted but payload {pointer} was not: {source}")]
    PayloadCleanup {
        pointer: PayloadPointer,
        source: PayloadError,
    },
}
