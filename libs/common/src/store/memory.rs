//! In-process document store
//!
//! Keeps every collection in memory behind a single lock, so unique index
//! checks and the insert they guard happen atomically.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{
    Document, DocumentStore, ID_FIELD, InsertOneResult, UpdateResult, matches, unique_index_name,
};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Document>,
    unique_fields: Vec<String>,
}

impl CollectionData {
    /// Name of the first unique index `document` would violate
    fn violated_index(&self, collection: &str, document: &Document) -> Option<String> {
        let id = document.get(ID_FIELD);
        if id.is_some() && self.documents.iter().any(|d| d.get(ID_FIELD) == id) {
            return Some(format!("{collection}_pkey"));
        }

        self.unique_fields.iter().find_map(|field| {
            let value = document.get(field)?;
            self.documents
                .iter()
                .any(|d| d.get(field) == Some(value))
                .then(|| unique_index_name(collection, field))
        })
    }
}

/// Document store held entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, CollectionData>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, |data| data.documents.len())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|data| {
                data.documents
                    .iter()
                    .filter(|document| matches(filter, document))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|data| {
            data.documents
                .iter()
                .find(|document| matches(filter, document))
                .cloned()
        }))
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> StoreResult<InsertOneResult> {
        let inserted_id = match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.clone(),
            _ => {
                return Err(StoreError::Configuration(format!(
                    "document inserted into '{collection}' has no string '{ID_FIELD}'"
                )));
            }
        };

        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();
        if let Some(index) = data.violated_index(collection, &document) {
            return Err(StoreError::DuplicateKey(index));
        }
        data.documents.push(document);

        Ok(InsertOneResult { inserted_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> StoreResult<UpdateResult> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections
            .get_mut(collection)
            .and_then(|data| data.documents.iter_mut().find(|d| matches(filter, d)))
        else {
            return Ok(UpdateResult::default());
        };

        let mut modified = false;
        for (key, value) in set {
            if document.get(key) != Some(value) {
                document.insert(key.clone(), value.clone());
                modified = true;
            }
        }

        Ok(UpdateResult {
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let data = collections.entry(collection.to_string()).or_default();
        if data.unique_fields.iter().any(|f| f == field) {
            return Ok(());
        }

        let mut seen = Vec::new();
        for value in data.documents.iter().filter_map(|d| d.get(field)) {
            if seen.contains(&value) {
                return Err(StoreError::DuplicateKey(unique_index_name(collection, field)));
            }
            seen.push(value);
        }

        data.unique_fields.push(field.to_string());
        Ok(())
    }
}
