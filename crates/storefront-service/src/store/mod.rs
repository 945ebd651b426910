//! Document storage shared by every resource service.
//!
//! Documents are serde types keyed by a string `_id`. Two backends sit
//! behind [`DocumentStore`]:
//! - MongoDB, for real deployments
//! - an in-memory map, for tests and ephemeral runs
//!
//! Backend failures surface as [`AppError::Internal`], except unique
//! constraint violations, which are 409 conflicts.

pub mod memory;
pub mod mongo;

use mongodb::bson;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Locates the elements of an embedded array by one of their string
/// fields, with a numeric counter field alongside.
#[derive(Debug, Clone, Copy)]
pub struct ArrayField<'a> {
    /// Name of the array field on the document.
    pub array: &'a str,
    /// Element field compared against the lookup key.
    pub key: &'a str,
    /// Element field holding the count.
    pub counter: &'a str,
}

/// Shared handle to the configured storage backend.
#[derive(Clone)]
pub enum DocumentStore {
    Mongo(MongoStore),
    Memory(MemoryStore),
}

impl DocumentStore {
    /// Connects to MongoDB. See [`MongoStore::connect`].
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, AppError> {
        Ok(Self::Mongo(MongoStore::connect(uri, database).await?))
    }

    pub fn in_memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    /// Backend name, for logs.
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Mongo(_) => "mongodb",
            Self::Memory(_) => "memory",
        }
    }

    /// Round-trips to the backend to verify it is reachable.
    pub async fn ping(&self) -> Result<(), AppError> {
        match self {
            Self::Mongo(store) => store.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Declares `field` unique within `collection`. Later inserts carrying
    /// an existing value fail with a 409.
    pub async fn ensure_unique(&self, collection: &str, field: &str) -> Result<(), AppError> {
        match self {
            Self::Mongo(store) => store.ensure_unique(collection, field).await,
            Self::Memory(store) => {
                store.add_unique(collection, field);
                Ok(())
            }
        }
    }

    pub async fn insert<T>(&self, collection: &str, document: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        match self {
            Self::Mongo(store) => {
                let document = bson::to_document(document)?;
                store.insert(collection, document).await
            }
            Self::Memory(store) => store.insert(collection, serde_json::to_value(document)?),
        }
    }

    pub async fn get<T>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Mongo(store) => Ok(store
                .get(collection, id)
                .await?
                .map(bson::from_document)
                .transpose()?),
            Self::Memory(store) => Ok(store
                .get(collection, id)
                .map(serde_json::from_value)
                .transpose()?),
        }
    }

    pub async fn list<T>(&self, collection: &str) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Mongo(store) => decode_all(store.list(collection).await?),
            Self::Memory(store) => decode_all_json(store.list(collection)),
        }
    }

    /// Documents whose string field `field` equals `value`.
    pub async fn find_by<T>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Mongo(store) => decode_all(store.find_by(collection, field, value).await?),
            Self::Memory(store) => decode_all_json(store.find_by(collection, field, value)),
        }
    }

    /// Replaces the document with `id`, inserting it when absent.
    pub async fn replace<T>(&self, collection: &str, id: &str, document: &T) -> Result<(), AppError>
    where
        T: Serialize + Sync,
    {
        match self {
            Self::Mongo(store) => {
                let document = bson::to_document(document)?;
                store.replace(collection, id, document).await
            }
            Self::Memory(store) => {
                store.replace(collection, id, serde_json::to_value(document)?);
                Ok(())
            }
        }
    }

    /// Adds `by` to the counter of the array element keyed `key`, appending
    /// the element (and creating the document) when absent. Atomic per
    /// document on both backends.
    pub async fn increment_element<T>(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
        by: u32,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Mongo(store) => Ok(bson::from_document(
                store.increment_element(collection, id, field, key, by).await?,
            )?),
            Self::Memory(store) => Ok(serde_json::from_value(
                store.increment_element(collection, id, field, key, by)?,
            )?),
        }
    }

    /// Removes the array element keyed `key`. Returns the updated document,
    /// or `None` when the document or the element does not exist.
    pub async fn pull_element<T>(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        match self {
            Self::Mongo(store) => Ok(store
                .pull_element(collection, id, field, key)
                .await?
                .map(bson::from_document)
                .transpose()?),
            Self::Memory(store) => Ok(store
                .pull_element(collection, id, field, key)
                .map(serde_json::from_value)
                .transpose()?),
        }
    }

    /// Removes the document with `id`. Returns whether it existed.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        match self {
            Self::Mongo(store) => store.delete(collection, id).await,
            Self::Memory(store) => Ok(store.delete(collection, id)),
        }
    }

    pub async fn count(&self, collection: &str) -> Result<u64, AppError> {
        match self {
            Self::Mongo(store) => store.count(collection).await,
            Self::Memory(store) => Ok(store.count(collection)),
        }
    }
}

fn decode_all<T: DeserializeOwned>(documents: Vec<bson::Document>) -> Result<Vec<T>, AppError> {
    documents
        .into_iter()
        .map(|d| bson::from_document(d).map_err(AppError::from))
        .collect()
}

fn decode_all_json<T: DeserializeOwned>(
    documents: Vec<serde_json::Value>,
) -> Result<Vec<T>, AppError> {
    documents
        .into_iter()
        .map(|d| serde_json::from_value(d).map_err(AppError::from))
        .collect()
}
