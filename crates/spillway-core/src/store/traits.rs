use async_trait::async_trait;

use crate::error::{ObjectStoreResult, PayloadResult};
use crate::pointer::PayloadPointer;

/// Storage for payloads too large to travel inside a queue message.
///
/// Implementations must be thread-safe; a single store is shared by every
/// caller of the client that owns it.
#[async_trait]
pub trait PayloadStore: Send + Sync {
    /// Durably write `payload` and return a pointer to it.
    ///
    /// Without a `key` the store generates a globally unique one. The pointer
    /// is only returned once the backing store acknowledged the write.
    async fn store(&self, payload: &[u8], key: Option<&str>) -> PayloadResult<PayloadPointer>;

    /// Read the payload a pointer refers to.
    async fn fetch(&self, pointer: &PayloadPointer) -> PayloadResult<Vec<u8>>;

    /// Remove the payload a pointer refers to. A missing payload is reported as
    /// `NotFound` so callers doing cleanup can treat it as already done.
    async fn delete(&self, pointer: &PayloadPointer) -> PayloadResult<()>;

    /// Decode a pointer from a message body, rejecting encodings this store
    /// does not own.
    fn parse_pointer(&self, raw: &str) -> PayloadResult<PayloadPointer>;
}

/// Bucket/key blob transport (S3 or compatible) consumed by
/// [`ObjectPayloadStore`](crate::ObjectPayloadStore).
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ObjectStoreResult<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>>;

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()>;
}
