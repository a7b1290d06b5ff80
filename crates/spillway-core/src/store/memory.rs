use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{ObjectStoreError, ObjectStoreResult, PayloadError, PayloadResult};
use crate::pointer::{PayloadPointer, PointerScheme};
use crate::store::traits::{ObjectStore, PayloadStore};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process [`ObjectStore`]. Can be switched into an unavailable state to
/// exercise transport failures, and counts calls per operation.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    unavailable: AtomicBool,
    puts: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every operation fails with [`ObjectStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.objects)
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> ObjectStoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "memory object store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ObjectStoreResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        lock(&self.objects).insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<Vec<u8>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.object(bucket, key)
            .ok_or_else(|| ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> ObjectStoreResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        match lock(&self.objects).remove(&(bucket.to_string(), key.to_string())) {
            Some(_) => Ok(()),
            None => Err(ObjectStoreError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// Payload store that keeps payloads in process memory under its own pointer
/// scheme. Useful wherever a real blob store is not wanted.
#[derive(Debug)]
pub struct MemoryPayloadStore {
    id: String,
    payloads: Mutex<HashMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
    stores: AtomicUsize,
    fetches: AtomicUsize,
    deletes: AtomicUsize,
}

impl Default for MemoryPayloadStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryPayloadStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            payloads: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            stores: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// While set, every operation fails with [`PayloadError::StoreUnavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Insert a payload directly, bypassing the call counters.
    pub fn insert(
        &self,
        key: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> PayloadResult<PayloadPointer> {
        let pointer = PayloadPointer::in_memory(self.id.as_str(), key)?;
        lock(&self.payloads).insert(pointer.key().to_string(), payload.into());
        Ok(pointer)
    }

    pub fn payload(&self, key: &str) -> Option<Vec<u8>> {
        lock(&self.payloads).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.payloads).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn store_count(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn check(&self, pointer: &PayloadPointer) -> PayloadResult<()> {
        if pointer.scheme() != PointerScheme::InMemory {
            return Err(PayloadError::TypeMismatch {
                expected: PointerScheme::InMemory,
                actual: pointer.scheme(),
            });
        }
        self.check_available()
    }

    fn check_available(&self) -> PayloadResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PayloadError::StoreUnavailable(format!(
                "memory payload store {} switched off",
                self.id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PayloadStore for MemoryPayloadStore {
    async fn store(&self, payload: &[u8], key: Option<&str>) -> PayloadResult<PayloadPointer> {
        self.stores.fetch_add(1, Ordering::SeqCst);
        let key = key.map_or_else(|| Uuid::now_v7().to_string(), str::to_string);
        let pointer = PayloadPointer::in_memory(self.id.as_str(), key)?;
        self.check_available()?;
        lock(&self.payloads).insert(pointer.key().to_string(), payload.to_vec());
        Ok(pointer)
    }

    async fn fetch(&self, pointer: &PayloadPointer) -> PayloadResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check(pointer)?;
        self.payload(pointer.key())
            .ok_or_else(|| PayloadError::NotFound(pointer.to_string()))
    }

    async fn delete(&self, pointer: &PayloadPointer) -> PayloadResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.check(pointer)?;
        match lock(&self.payloads).remove(pointer.key()) {
            Some(_) => Ok(()),
            None => Err(PayloadError::NotFound(pointer.to_string())),
        }
    }

    fn parse_pointer(&self, raw: &str) -> PayloadResult<PayloadPointer> {
        let pointer = PayloadPointer::parse(raw)?;
        if pointer.scheme() != PointerScheme::InMemory {
            return Err(PayloadError::TypeMismatch {
                expected: PointerScheme::InMemory,
                actual: pointer.scheme(),
            });
        }
        Ok(pointer)
    }
}
