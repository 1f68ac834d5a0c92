//! Trip repository for record store operations

use common::{
    error::{StoreError, StoreResult},
    scope::OperationScope,
    store::{Collection, DocumentStore, filter_eq, from_document},
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{Trip, TripUpdate};

/// Collection holding trips
pub const TRIPS_COLLECTION: &str = "trips";

/// Trip repository for record store operations
#[derive(Clone)]
pub struct TripRepository {
    trips: Collection,
}

impl TripRepository {
    /// Create a new trip repository
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            trips: Collection::new(store, TRIPS_COLLECTION),
        }
    }

    /// Get a trip by ID
    ///
    /// A missing trip is reported as [`StoreError::NotFound`].
    pub async fn find_by_id(&self, scope: &OperationScope, id: Uuid) -> StoreResult<Trip> {
        let document = self
            .trips
            .find_one(scope, &filter_eq("id", id.to_string()))
            .await?
            .ok_or(StoreError::NotFound)?;

        from_document(document)
    }

    /// Apply a partial update and return the trip as stored afterwards
    ///
    /// Returns `None` when no trip has this ID.
    pub async fn update(
        &self,
        scope: &OperationScope,
        id: Uuid,
        update: &TripUpdate,
    ) -> StoreResult<Option<Trip>> {
        info!("Updating trip: {}", id);

        let result = self
            .trips
            .update_one(scope, &filter_eq("id", id.to_string()), &update.changes())
            .await?;

        if result.matched_count == 1 {
            Ok(Some(self.find_by_id(scope, id).await?))
        } else {
            Ok(None)
        }
    }
}
