mod client;
mod error;
mod memory;
mod queue;

pub use client::{ExtendedQueueClient, ReceiveBatch};
pub use error::{DeleteError, MessageFailure, QueueError, ReceiveError, ResolveError, SendError};
pub use memory::MemoryQueue;
pub use queue::{
    QueueClient, ReceiveMessageRequest, ReceiveMessageResult, SendMessageRequest,
    SendMessageResult,
};

/// Re-export the core types for callers that only depend on the SDK.
pub use spillway_core;
