mod memory;
mod object;
mod traits;

pub use memory::{MemoryObjectStore, MemoryPayloadStore};
pub use object::ObjectPayloadStore;
pub use traits::{ObjectStore, PayloadStore};
