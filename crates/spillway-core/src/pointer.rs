use std::fmt;

use serde::Deserialize;

use crate::error::{PayloadError, PayloadResult};

/// Identifies which kind of payload store produced a pointer, and therefore
/// which wire encoding the pointer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerScheme {
    /// Bucket/key object storage (S3 and compatible stores).
    ObjectStore,
    /// Process-local store used by tests and demos.
    InMemory,
}

impl fmt::Display for PointerScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerScheme::ObjectStore => f.write_str("object-store"),
            PointerScheme::InMemory => f.write_str("in-memory"),
        }
    }
}

/// Reference to a payload that was moved out of a message body.
///
/// A pointer is only ever durable as the body of the message that carries it.
/// Both `store_id` and `key` are non-empty; there is no way to build a pointer
/// that violates this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadPointer {
    scheme: PointerScheme,
    store_id: String,
    key: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ObjectPointerWire {
    #[serde(rename = "s3BucketName")]
    bucket: String,
    #[serde(rename = "s3Key")]
    key: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MemoryPointerWire {
    #[serde(rename = "memoryStoreId")]
    store_id: String,
    #[serde(rename = "memoryKey")]
    key: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PointerWire {
    Object(ObjectPointerWire),
    Memory(MemoryPointerWire),
}

impl PayloadPointer {
    pub fn new(
        scheme: PointerScheme,
        store_id: impl Into<String>,
        key: impl Into<String>,
    ) -> PayloadResult<Self> {
        let store_id = store_id.into();
        let key = key.into();
        if store_id.is_empty() {
            return Err(PayloadError::MalformedPointer(
                "store id must not be empty".to_string(),
            ));
        }
        if key.is_empty() {
            return Err(PayloadError::MalformedPointer(
                "key must not be empty".to_string(),
            ));
        }
        Ok(Self {
            scheme,
            store_id,
            key,
        })
    }

    /// Pointer to `key` inside object-store bucket `bucket`.
    pub fn object(bucket: impl Into<String>, key: impl Into<String>) -> PayloadResult<Self> {
        Self::new(PointerScheme::ObjectStore, bucket, key)
    }

    /// Pointer to `key` inside the in-memory store named `store_id`.
    pub fn in_memory(store_id: impl Into<String>, key: impl Into<String>) -> PayloadResult<Self> {
        Self::new(PointerScheme::InMemory, store_id, key)
    }

    pub fn scheme(&self) -> PointerScheme {
        self.scheme
    }

    /// Bucket name for object-store pointers, store name otherwise.
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encode as the compact JSON string placed in the message body.
    ///
    /// Control characters in the key are escaped by the JSON encoding, so the
    /// result is always a single printable line.
    pub fn serialize(&self) -> String {
        let value = match self.scheme {
            PointerScheme::ObjectStore => serde_json::json!({
                "s3BucketName": self.store_id,
                "s3Key": self.key,
            }),
            PointerScheme::InMemory => serde_json::json!({
                "memoryStoreId": self.store_id,
                "memoryKey": self.key,
            }),
        };
        value.to_string()
    }

    /// Decode a pointer produced by [`serialize`](Self::serialize).
    ///
    /// Rejects anything that is not exactly one of the known encodings:
    /// unknown or duplicate fields, missing or empty fields, non-string values
    /// and trailing input all fail with [`PayloadError::MalformedPointer`].
    pub fn parse(raw: &str) -> PayloadResult<Self> {
        let wire: PointerWire = serde_json::from_str(raw).map_err(|e| {
            PayloadError::MalformedPointer(format!("not a payload pointer: {e}"))
        })?;
        match wire {
            PointerWire::Object(p) => Self::object(p.bucket, p.key),
            PointerWire::Memory(p) => Self::in_memory(p.store_id, p.key),
        }
    }
}

impl fmt::Display for PayloadPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.scheme, self.store_id, self.key)
    }
}
