//! MongoDB-backed document store.

use futures_util::TryStreamExt;
use mongodb::bson::{Document, doc};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};

use super::ArrayField;
use crate::error::AppError;

/// Database used when neither the config nor the URI names one.
pub const DEFAULT_DATABASE: &str = "ecommerce";

/// Rounds of the match-then-upsert loop in
/// [`increment_element`](MongoStore::increment_element) before giving up.
const UPSERT_ATTEMPTS: usize = 5;

/// Handle to a MongoDB database. Cheap to clone; the driver pools
/// connections internally.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Builds a client from a connection string.
    ///
    /// `database` overrides the database named in the URI; without either,
    /// [`DEFAULT_DATABASE`] is used. The driver connects lazily, so callers
    /// should [`ping`](Self::ping) before serving traffic.
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, AppError> {
        let client = Client::with_uri_str(uri).await?;
        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        Ok(Self { db })
    }

    pub fn database_name(&self) -> &str {
        self.db.name()
    }

    pub async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    /// Creates a unique ascending index on `field`. Idempotent.
    pub async fn ensure_unique(&self, collection: &str, field: &str) -> Result<(), AppError> {
        let mut keys = Document::new();
        keys.insert(field, 1);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(collection).create_index(index).await?;
        tracing::debug!(collection, field, "unique index ensured");
        Ok(())
    }

    pub async fn insert(&self, collection: &str, document: Document) -> Result<(), AppError> {
        self.collection(collection).insert_one(document).await?;
        Ok(())
    }

    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self
            .collection(collection)
            .find_one(doc! { "_id": id })
            .await?)
    }

    pub async fn list(&self, collection: &str) -> Result<Vec<Document>, AppError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn find_by(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, AppError> {
        let mut filter = Document::new();
        filter.insert(field, value);
        let cursor = self.collection(collection).find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn replace(
        &self,
        collection: &str,
        id: &str,
        document: Document,
    ) -> Result<(), AppError> {
        self.collection(collection)
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    /// Atomically adds `by` to the counter of the matching array element,
    /// or pushes a new element (upserting the document) when none matches.
    ///
    /// Both steps are single-document atomic updates. When another writer
    /// slips in between them, the guarded upsert either misses its filter
    /// or hits the `_id` index, and the loop retries the increment.
    pub async fn increment_element(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
        by: u32,
    ) -> Result<Document, AppError> {
        let coll = self.collection(collection);
        let key_path = format!("{}.{}", field.array, field.key);
        let counter_path = format!("{}.$.{}", field.array, field.counter);

        for _ in 0..UPSERT_ATTEMPTS {
            let mut filter = doc! { "_id": id };
            filter.insert(key_path.as_str(), key);
            let mut inc = Document::new();
            inc.insert(counter_path.as_str(), i64::from(by));
            let updated = coll
                .find_one_and_update(filter, doc! { "$inc": inc })
                .return_document(ReturnDocument::After)
                .await?;
            if let Some(updated) = updated {
                return Ok(updated);
            }

            let mut filter = doc! { "_id": id };
            filter.insert(key_path.as_str(), doc! { "$ne": key });
            let mut element = Document::new();
            element.insert(field.key, key);
            element.insert(field.counter, i64::from(by));
            let mut push = Document::new();
            push.insert(field.array, element);
            let pushed = coll
                .find_one_and_update(filter, doc! { "$push": push })
                .upsert(true)
                .return_document(ReturnDocument::After)
                .await
                .map_err(AppError::from);
            match pushed {
                Ok(Some(updated)) => return Ok(updated),
                Ok(None) => {}
                Err(e) if e.status_code() == 409 => {}
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(format!(
            "{collection}/{id}: element update kept racing after {UPSERT_ATTEMPTS} attempts"
        )))
    }

    /// Atomically removes the matching array element. `None` when the
    /// document or the element is absent.
    pub async fn pull_element(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
    ) -> Result<Option<Document>, AppError> {
        let mut filter = doc! { "_id": id };
        filter.insert(format!("{}.{}", field.array, field.key), key);
        let mut matcher = Document::new();
        matcher.insert(field.key, key);
        let mut pull = Document::new();
        pull.insert(field.array, matcher);

        Ok(self
            .collection(collection)
            .find_one_and_update(filter, doc! { "$pull": pull })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    pub async fn count(&self, collection: &str) -> Result<u64, AppError> {
        Ok(self
            .collection(collection)
            .count_documents(doc! {})
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use crate::types::{Cart, CartItem, User};

    const ITEMS: ArrayField<'static> = ArrayField {
        array: "items",
        key: "product_id",
        counter: "quantity",
    };

    /// Runs against a live server: `MONGO_URI=mongodb://localhost:27017 cargo test -- --ignored`.
    /// Uses a throwaway database that is dropped afterwards.
    #[tokio::test]
    #[ignore = "needs a running MongoDB (set MONGO_URI)"]
    async fn round_trip_against_live_server() {
        let Ok(uri) = std::env::var("MONGO_URI") else {
            return;
        };
        let name = format!("storefront_test_{}", uuid::Uuid::new_v4().simple());
        let mongo = MongoStore::connect(&uri, Some(&name)).await.unwrap();
        mongo.ping().await.unwrap();
        assert_eq!(mongo.database_name(), name);
        mongo.ensure_unique("users", "email").await.unwrap();
        mongo.ensure_unique("users", "email").await.unwrap();
        let store = DocumentStore::Mongo(mongo.clone());

        let ada = User {
            id: "u1".to_owned(),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        };
        store.insert("users", &ada).await.unwrap();
        assert_eq!(store.get::<User>("users", "u1").await.unwrap(), Some(ada.clone()));
        assert_eq!(
            store.find_by::<User>("users", "email", "ada@example.com").await.unwrap(),
            vec![ada.clone()]
        );

        let twin = User {
            id: "u2".to_owned(),
            ..ada.clone()
        };
        let err = store.insert("users", &twin).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let renamed = User {
            name: "Ada L.".to_owned(),
            ..ada
        };
        store.replace("users", "u1", &renamed).await.unwrap();
        assert_eq!(store.list::<User>("users").await.unwrap(), vec![renamed]);
        assert_eq!(store.count("users").await.unwrap(), 1);

        store.increment_element::<Cart>("carts", "c1", &ITEMS, "pen", 2).await.unwrap();
        let cart: Cart = store
            .increment_element("carts", "c1", &ITEMS, "pen", 3)
            .await
            .unwrap();
        assert_eq!(
            cart.items,
            vec![CartItem {
                product_id: "pen".to_owned(),
                quantity: 5,
            }]
        );
        let cart: Option<Cart> = store.pull_element("carts", "c1", &ITEMS, "pen").await.unwrap();
        assert!(cart.unwrap().items.is_empty());
        assert!(
            store
                .pull_element::<Cart>("carts", "c1", &ITEMS, "pen")
                .await
                .unwrap()
                .is_none()
        );

        assert!(store.delete("users", "u1").await.unwrap());
        assert!(!store.delete("users", "u1").await.unwrap());

        mongo.db.drop().await.unwrap();
    }
}
