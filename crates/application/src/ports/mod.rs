//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod http_transport;
mod storage;

pub use http_transport::{HttpTransport, TransportError, TransportFuture};
pub use storage::{KeyValueStorage, MemoryStorage, StorageError};
