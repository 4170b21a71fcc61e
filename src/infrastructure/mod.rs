//! Infrastructure layer wiring concrete adapters (storage, HTTP client).

pub mod http_client;
pub mod storage;

pub use http_client::{check_service_availability, RemoteDirectoryClient};
pub use storage::SledDirectoryStore;
