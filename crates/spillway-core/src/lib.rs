pub mod config;
pub mod error;
pub mod message;
pub mod pointer;
pub mod store;
pub mod telemetry;

pub use config::OffloadConfig;
pub use error::{ConfigError, ObjectStoreError, ObjectStoreResult, PayloadError, PayloadResult};
pub use message::{
    message_attributes_size, Message, MessageAttributeValue, MessageAttributes,
    DEFAULT_MESSAGE_SIZE_THRESHOLD, RESERVED_ATTRIBUTE_NAME, TRANSPORT_MAX_MESSAGE_ATTRIBUTES,
};
pub use pointer::{PayloadPointer, PointerScheme};
pub use store::{
    MemoryObjectStore, MemoryPayloadStore, ObjectPayloadStore, ObjectStore, PayloadStore,
};
