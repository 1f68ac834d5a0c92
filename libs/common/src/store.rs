//! Record store adapter
//!
//! The service talks to its document database through named [`Collection`]
//! handles. Each handle forwards to a [`DocumentStore`] backend and bounds
//! every call with the caller's [`OperationScope`].
//!
//! Filters are JSON objects matched by top-level equality: a document
//! matches when every key of the filter is present with an equal value.
//! An empty filter matches every document of the collection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::scope::OperationScope;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// A stored record, filter or update expression
pub type Document = serde_json::Map<String, Value>;

/// Key holding a document's unique identifier
pub const ID_FIELD: &str = "id";

/// Outcome of [`Collection::insert_one`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOneResult {
    pub inserted_id: String,
}

/// Outcome of [`Collection::update_one`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub matched_count: u64,
    pub modified_count: u64,
}

/// Backend operations behind a [`Collection`]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every document in `collection` matching `filter`
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>>;

    /// The first document in `collection` matching `filter`, if any
    async fn find_one(&self, collection: &str, filter: &Document)
    -> StoreResult<Option<Document>>;

    /// Persist `document`, which already carries its `id`
    async fn insert_one(&self, collection: &str, document: Document)
    -> StoreResult<InsertOneResult>;

    /// Overwrite the keys of `set` on the first document matching `filter`
    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> StoreResult<UpdateResult>;

    /// Reject future inserts that repeat a value of `field`
    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()>;
}

/// Name of the unique index guarding `field` in `collection`
pub fn unique_index_name(collection: &str, field: &str) -> String {
    format!("{collection}_{field}_key")
}

/// Whether `document` satisfies `filter`
pub fn matches(filter: &Document, document: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

/// Build a single-key equality filter
pub fn filter_eq(key: &str, value: impl Into<Value>) -> Document {
    let mut filter = Document::new();
    filter.insert(key.to_string(), value.into());
    filter
}

/// Serialize a typed value into a document
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::Configuration(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Deserialize a document into a typed value
pub fn from_document<T: DeserializeOwned>(document: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Return the document's id, assigning a fresh one when it has none
fn ensure_id(document: &mut Document) -> String {
    match document.get(ID_FIELD) {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    }
}

/// Result set of a [`Collection::find`] call
#[derive(Debug)]
pub struct Cursor {
    documents: std::vec::IntoIter<Document>,
}

impl Cursor {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: documents.into_iter(),
        }
    }

    /// Whether no documents are left to read
    pub fn is_exhausted(&self) -> bool {
        self.documents.len() == 0
    }

    /// Drain the cursor, decoding every remaining document as `T`
    pub fn deserialize_all<T: DeserializeOwned>(self) -> StoreResult<Vec<T>> {
        self.documents.map(from_document).collect()
    }
}

impl Iterator for Cursor {
    type Item = Document;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.documents.size_hint()
    }
}

/// Handle on one named collection of the record store
#[derive(Clone)]
pub struct Collection {
    name: String,
    store: Arc<dyn DocumentStore>,
}

impl Collection {
    /// Create a handle on `name` backed by `store`
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    /// Find every document matching `filter`
    pub async fn find(&self, scope: &OperationScope, filter: &Document) -> StoreResult<Cursor> {
        debug!(collection = %self.name, ?filter, "find");
        let documents = scope.run(self.store.find(&self.name, filter)).await?;
        Ok(Cursor::new(documents))
    }

    /// Find the first document matching `filter`
    pub async fn find_one(
        &self,
        scope: &OperationScope,
        filter: &Document,
    ) -> StoreResult<Option<Document>> {
        debug!(collection = %self.name, ?filter, "find_one");
        scope.run(self.store.find_one(&self.name, filter)).await
    }

    /// Insert a document, assigning an `id` when it carries none
    pub async fn insert_one(
        &self,
        scope: &OperationScope,
        mut document: Document,
    ) -> StoreResult<InsertOneResult> {
        let id = ensure_id(&mut document);
        debug!(collection = %self.name, %id, "insert_one");
        scope.run(self.store.insert_one(&self.name, document)).await
    }

    /// Apply `$set`-style partial update to the first document matching `filter`
    ///
    /// Keys absent from `set` keep their stored values. The `id` key cannot be
    /// rewritten.
    pub async fn update_one(
        &self,
        scope: &OperationScope,
        filter: &Document,
        set: &Document,
    ) -> StoreResult<UpdateResult> {
        if set.contains_key(ID_FIELD) {
            return Err(StoreError::Configuration(format!(
                "the '{ID_FIELD}' field cannot be updated"
            )));
        }
        debug!(collection = %self.name, ?filter, ?set, "update_one");
        scope.run(self.store.update_one(&self.name, filter, set)).await
    }

    /// Enforce uniqueness of `field` across this collection
    pub async fn create_unique_index(
        &self,
        scope: &OperationScope,
        field: &str,
    ) -> StoreResult<()> {
        debug!(collection = %self.name, field, "create_unique_index");
        scope.run(self.store.create_unique_index(&self.name, field)).await
    }
}
