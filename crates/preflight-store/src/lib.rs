//! Analysis record persistence.
//!
//! This crate provides:
//! - The [`AnalysisRecordStore`] trait: create, get, and terminal-guarded update
//! - [`InMemoryRecordStore`] for single-node deployments and tests
//! - [`FirestoreRecordStore`] over the Firestore REST API, with service
//!   account auth, retry with backoff, and optimistic concurrency on `updateTime`

pub mod error;
pub mod firestore;
pub mod memory;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use firestore::{FirestoreClient, FirestoreConfig, FirestoreError, FirestoreRecordStore, RetryConfig};
pub use memory::InMemoryRecordStore;
pub use store::{AnalysisRecordStore, UpdateOutcome};
