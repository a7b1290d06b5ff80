use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use crate::error::{PayloadError, PayloadResult};
use crate::pointer::{PayloadPointer, PointerScheme};
use crate::store::traits::{ObjectStore, PayloadStore};

/// Payload store backed by a bucket in an object store.
///
/// New payloads are written to the configured bucket. Reads and deletes follow
/// the bucket named by the pointer, so a consumer configured with a different
/// bucket can still resolve pointers produced elsewhere.
pub struct ObjectPayloadStore {
    objects: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectPayloadStore {
    /// The bucket must already exist in the object store.
    pub fn new(objects: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            objects,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn ensure_owned(&self, pointer: &PayloadPointer) -> PayloadResult<()> {
        if pointer.scheme() != PointerScheme::ObjectStore {
            return Err(PayloadError::TypeMismatch {
                expected: PointerScheme::ObjectStore,
                actual: pointer.scheme(),
            });
        }
        Ok(())
    }
}

/// UUIDv7 keys: unique across concurrent producers and roughly time-ordered
/// inside the bucket.
fn generate_key() -> String {
    Uuid::now_v7().to_string()
}

#[async_trait]
impl PayloadStore for ObjectPayloadStore {
    async fn store(&self, payload: &[u8], key: Option<&str>) -> PayloadResult<PayloadPointer> {
        let key = key.map_or_else(generate_key, str::to_string);
        // Build the pointer first so an invalid bucket or key never reaches the store.
        let pointer = PayloadPointer::object(self.bucket.as_str(), key)?;
        self.objects
            .put_object(pointer.store_id(), pointer.key(), payload.to_vec())
            .await?;
        debug!(
            bucket = %pointer.store_id(),
            key = %pointer.key(),
            size = payload.len(),
            "payload stored"
        );
        Ok(pointer)
    }

    async fn fetch(&self, pointer: &PayloadPointer) -> PayloadResult<Vec<u8>> {
        self.ensure_owned(pointer)?;
        let body = self
            .objects
            .get_object(pointer.store_id(), pointer.key())
            .await?;
        debug!(
            bucket = %pointer.store_id(),
            key = %pointer.key(),
            size = body.len(),
            "payload fetched"
        );
        Ok(body)
    }

    async fn delete(&self, pointer: &PayloadPointer) -> PayloadResult<()> {
        self.ensure_owned(pointer)?;
        self.objects
            .delete_object(pointer.store_id(), pointer.key())
            .await?;
        debug!(bucket = %pointer.store_id(), key = %pointer.key(), "payload deleted");
        Ok(())
    }

    fn parse_pointer(&self, raw: &str) -> PayloadResult<PayloadPointer> {
        let pointer = PayloadPointer::parse(raw)?;
        self.ensure_owned(&pointer)?;
        Ok(pointer)
    }
}
