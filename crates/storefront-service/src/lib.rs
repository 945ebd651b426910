//! Storefront Service - core business logic for the Storefront server.
//!
//! This crate contains all transport-agnostic logic: the shared error
//! type, document storage, and the per-resource services (accounts,
//! catalog, carts, administration).
//!
//! The HTTP transport enables the `http` feature to get the terminal JSON
//! error handler (`IntoResponse for AppError`).

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod store;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

pub use error::AppError;
use store::{DocumentStore, MemoryStore};
use types::collections::UNIQUE_FIELDS;

/// Configuration subset relevant to the service layer.
///
/// Transport-specific config (ports, CORS origins, body limits) stays in
/// the binary crate's `Config` struct.
pub struct ServiceConfig {
    pub mongo_uri: String,
    pub mongo_database: Option<String>,
}

/// Shared service state, cloneable across all handlers.
#[derive(Clone)]
pub struct ServiceState {
    inner: Arc<Inner>,
}

struct Inner {
    store: DocumentStore,
    start_time: Instant,
}

impl ServiceState {
    /// Connects to the configured database, verifies it is reachable and
    /// ensures the unique indexes exist.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, AppError> {
        let store =
            DocumentStore::connect(&config.mongo_uri, config.mongo_database.as_deref()).await?;
        store.ping().await?;
        for &(collection, field) in UNIQUE_FIELDS {
            store.ensure_unique(collection, field).await?;
        }
        if let DocumentStore::Mongo(mongo) = &store {
            tracing::info!(database = mongo.database_name(), "Database connected");
        }
        Ok(Self::with_store(store))
    }

    /// Creates an in-memory service state (for tests and ephemeral use).
    pub fn new_in_memory() -> Self {
        let memory = MemoryStore::new();
        for &(collection, field) in UNIQUE_FIELDS {
            memory.add_unique(collection, field);
        }
        Self::with_store(DocumentStore::Memory(memory))
    }

    fn with_store(store: DocumentStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                start_time: Instant::now(),
            }),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Returns the process uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.inner.start_time.elapsed().as_secs()
    }
}
