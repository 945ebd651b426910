//! In-memory document store for tests and ephemeral runs.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};

use super::ArrayField;
use crate::error::{AppError, DUPLICATE_MESSAGE};

/// Collections of JSON documents keyed by their `_id` string, kept in
/// insertion order.
///
/// Every write holds the collection's map entry for its whole
/// read-check-write, so concurrent writers to one collection serialize.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Vec<Value>>>,
    unique: Arc<DashMap<String, Vec<String>>>,
}

fn id_of(doc: &Value) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `field` unique within `collection`, the way a unique index
    /// would.
    pub fn add_unique(&self, collection: &str, field: &str) {
        let mut fields = self.unique.entry(collection.to_owned()).or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_owned());
        }
    }

    /// Inserts a document. A missing `_id` is an internal error; a duplicate
    /// `_id` or unique field value is a conflict.
    pub fn insert(&self, collection: &str, doc: Value) -> Result<(), AppError> {
        let id = id_of(&doc)
            .ok_or_else(|| AppError::internal(format!("document in {collection} has no _id")))?
            .to_owned();
        let unique = self
            .unique
            .get(collection)
            .map(|fields| fields.value().clone())
            .unwrap_or_default();

        let mut docs = self.collections.entry(collection.to_owned()).or_default();
        let clashes = |existing: &Value| {
            id_of(existing) == Some(id.as_str())
                || unique.iter().any(|field| {
                    doc.get(field)
                        .is_some_and(|v| !v.is_null() && existing.get(field) == Some(v))
                })
        };
        if docs.iter().any(clashes) {
            tracing::debug!(collection, id = %id, "unique constraint violated");
            return Err(AppError::conflict(DUPLICATE_MESSAGE));
        }
        docs.push(doc);
        Ok(())
    }

    pub fn get(&self, collection: &str, id: &str) -> Option<Value> {
        self.collections
            .get(collection)?
            .iter()
            .find(|d| id_of(d) == Some(id))
            .cloned()
    }

    pub fn list(&self, collection: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    /// Documents whose string field `field` equals `value`.
    pub fn find_by(&self, collection: &str, field: &str, value: &str) -> Vec<Value> {
        self.collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replaces the document with the given id, inserting it when absent.
    pub fn replace(&self, collection: &str, id: &str, doc: Value) {
        let mut docs = self.collections.entry(collection.to_owned()).or_default();
        match docs.iter().position(|d| id_of(d) == Some(id)) {
            Some(pos) => docs[pos] = doc,
            None => docs.push(doc),
        }
    }

    /// Adds `by` to the counter of the array element whose key is `key`,
    /// appending `{key, counter: by}` when no element matches. A missing
    /// document is created. Returns the updated document.
    pub fn increment_element(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
        by: u32,
    ) -> Result<Value, AppError> {
        let mut docs = self.collections.entry(collection.to_owned()).or_default();
        let pos = match docs.iter().position(|d| id_of(d) == Some(id)) {
            Some(pos) => pos,
            None => {
                let mut fresh = Map::new();
                fresh.insert("_id".to_owned(), Value::from(id));
                docs.push(Value::Object(fresh));
                docs.len() - 1
            }
        };

        let Some(doc) = docs[pos].as_object_mut() else {
            return Err(AppError::internal(format!(
                "document {id} in {collection} is not an object"
            )));
        };
        let slot = doc
            .entry(field.array)
            .or_insert_with(|| Value::Array(Vec::new()));
        let Some(items) = slot.as_array_mut() else {
            return Err(AppError::internal(format!(
                "{}.{} in {collection} is not an array",
                id, field.array
            )));
        };

        match items
            .iter_mut()
            .find(|item| item.get(field.key).and_then(Value::as_str) == Some(key))
        {
            Some(item) => {
                let current = item.get(field.counter).and_then(Value::as_u64).unwrap_or(0);
                let next = current
                    .saturating_add(u64::from(by))
                    .min(u64::from(u32::MAX));
                item[field.counter] = Value::from(next);
            }
            None => {
                let mut item = Map::new();
                item.insert(field.key.to_owned(), Value::from(key));
                item.insert(field.counter.to_owned(), Value::from(by));
                items.push(Value::Object(item));
            }
        }

        Ok(docs[pos].clone())
    }

    /// Removes the array element whose key is `key`. Returns the updated
    /// document, or `None` when the document or the element is absent.
    pub fn pull_element(
        &self,
        collection: &str,
        id: &str,
        field: &ArrayField<'_>,
        key: &str,
    ) -> Option<Value> {
        let mut docs = self.collections.get_mut(collection)?;
        let doc = docs.iter_mut().find(|d| id_of(d) == Some(id))?;
        let items = doc.get_mut(field.array)?.as_array_mut()?;

        let before = items.len();
        items.retain(|item| item.get(field.key).and_then(Value::as_str) != Some(key));
        if items.len() == before {
            return None;
        }
        Some(doc.clone())
    }

    /// Removes a document. Returns whether it existed.
    pub fn delete(&self, collection: &str, id: &str) -> bool {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return false;
        };
        let before = docs.len();
        docs.retain(|d| id_of(d) != Some(id));
        docs.len() != before
    }

    pub fn count(&self, collection: &str) -> u64 {
        self.collections
            .get(collection)
            .map_or(0, |docs| docs.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_get_delete() {
        let store = MemoryStore::new();
        store
            .insert("things", json!({"_id": "a", "name": "first"}))
            .unwrap();
        store
            .insert("things", json!({"_id": "b", "name": "second"}))
            .unwrap();

        assert_eq!(store.get("things", "a").unwrap()["name"], "first");
        assert!(store.get("things", "zzz").is_none());
        assert!(store.get("missing", "a").is_none());
        assert_eq!(store.count("things"), 2);

        assert!(store.delete("things", "a"));
        assert!(!store.delete("things", "a"));
        assert!(!store.delete("missing", "a"));
        assert_eq!(store.count("things"), 1);
    }

    const ITEMS: ArrayField<'static> = ArrayField {
        array: "items",
        key: "sku",
        counter: "qty",
    };

    #[test]
    fn duplicate_and_missing_ids_are_rejected() {
        let store = MemoryStore::new();
        store.insert("things", json!({"_id": "a"})).unwrap();

        let err = store.insert("things", json!({"_id": "a"})).unwrap_err();
        assert_eq!(err.status_code(), 409);

        let err = store.insert("things", json!({"name": "no id"})).unwrap_err();
        assert!(!err.is_operational());
    }

    #[test]
    fn unique_fields_are_enforced_on_insert() {
        let store = MemoryStore::new();
        store.add_unique("users", "email");
        store.add_unique("users", "email");

        store
            .insert("users", json!({"_id": "1", "email": "a@x.io"}))
            .unwrap();
        let err = store
            .insert("users", json!({"_id": "2", "email": "a@x.io"}))
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), DUPLICATE_MESSAGE);

        // Other collections and other values are unaffected.
        store
            .insert("users", json!({"_id": "3", "email": "b@x.io"}))
            .unwrap();
        store
            .insert("admins", json!({"_id": "1", "email": "a@x.io"}))
            .unwrap();
        assert_eq!(store.count("users"), 2);
    }

    #[test]
    fn increment_element_creates_appends_and_accumulates() {
        let store = MemoryStore::new();

        let doc = store.increment_element("carts", "u1", &ITEMS, "pen", 2).unwrap();
        assert_eq!(doc, json!({"_id": "u1", "items": [{"sku": "pen", "qty": 2}]}));

        store.increment_element("carts", "u1", &ITEMS, "ink", 1).unwrap();
        let doc = store.increment_element("carts", "u1", &ITEMS, "pen", 3).unwrap();
        assert_eq!(
            doc["items"],
            json!([{"sku": "pen", "qty": 5}, {"sku": "ink", "qty": 1}])
        );
        assert_eq!(store.get("carts", "u1").unwrap(), doc);
        assert_eq!(store.count("carts"), 1);
    }

    #[test]
    fn increment_element_saturates() {
        let store = MemoryStore::new();
        store
            .increment_element("carts", "u1", &ITEMS, "pen", u32::MAX)
            .unwrap();
        let doc = store.increment_element("carts", "u1", &ITEMS, "pen", 5).unwrap();
        assert_eq!(doc["items"][0]["qty"], u64::from(u32::MAX));
    }

    #[test]
    fn pull_element_reports_missing_targets() {
        let store = MemoryStore::new();
        assert!(store.pull_element("carts", "u1", &ITEMS, "pen").is_none());

        store.increment_element("carts", "u1", &ITEMS, "pen", 1).unwrap();
        store.increment_element("carts", "u1", &ITEMS, "ink", 1).unwrap();

        let doc = store.pull_element("carts", "u1", &ITEMS, "pen").unwrap();
        assert_eq!(doc["items"], json!([{"sku": "ink", "qty": 1}]));
        assert!(store.pull_element("carts", "u1", &ITEMS, "pen").is_none());
        assert!(store.pull_element("carts", "u2", &ITEMS, "ink").is_none());
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..50 {
                        store.increment_element("carts", "u1", &ITEMS, "pen", 1).unwrap();
                    }
                });
            }
        });
        assert_eq!(store.get("carts", "u1").unwrap()["items"][0]["qty"], 400);
    }

    #[test]
    fn list_keeps_insertion_order() {
        let store = MemoryStore::new();
        for id in ["c", "a", "b"] {
            store.insert("things", json!({"_id": id})).unwrap();
        }
        let ids: Vec<_> = store
            .list("things")
            .iter()
            .map(|d| d["_id"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(ids, ["c", "a", "b"]);
        assert!(store.list("missing").is_empty());
    }

    #[test]
    fn replace_upserts() {
        let store = MemoryStore::new();
        store.replace("carts", "u1", json!({"_id": "u1", "items": []}));
        store.replace("carts", "u1", json!({"_id": "u1", "items": [1]}));
        assert_eq!(store.count("carts"), 1);
        assert_eq!(store.get("carts", "u1").unwrap()["items"], json!([1]));
    }

    #[test]
    fn find_by_matches_string_fields() {
        let store = MemoryStore::new();
        store
            .insert("users", json!({"_id": "1", "email": "a@x.io"}))
            .unwrap();
        store
            .insert("users", json!({"_id": "2", "email": "b@x.io"}))
            .unwrap();
        assert_eq!(store.find_by("users", "email", "b@x.io").len(), 1);
        assert!(store.find_by("users", "email", "c@x.io").is_empty());
    }
}
