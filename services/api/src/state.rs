//! Application state shared across handlers

use common::{scope::OperationScope, store::DocumentStore};
use std::sync::Arc;
use std::time::Duration;

use crate::repositories::{TripRepository, UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_repository: UserRepository,
    pub trip_repository: TripRepository,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wire every repository to the one store handle opened at startup
    pub fn new(store: Arc<dyn DocumentStore>, request_timeout: Duration) -> Self {
        Self {
            user_repository: UserRepository::new(store.clone()),
            trip_repository: TripRepository::new(store),
            request_timeout,
        }
    }

    /// Open the bounded scope for one request
    pub fn scope(&self) -> OperationScope {
        OperationScope::new(self.request_timeout)
    }
}
