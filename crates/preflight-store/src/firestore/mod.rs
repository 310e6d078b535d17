//! Firestore REST backend.

pub mod client;
pub mod error;
pub mod metrics;
pub mod record_repo;
pub mod retry;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use record_repo::FirestoreRecordStore;
pub use retry::RetryConfig;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
