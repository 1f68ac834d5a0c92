//! Repositories for record store operations

use common::{
    error::StoreResult,
    scope::OperationScope,
    store::{Collection, Document, DocumentStore, InsertOneResult, filter_eq, to_document},
};
use std::sync::Arc;
use tracing::info;

use crate::models::{User, UserResponse};

pub mod trip;

pub use trip::TripRepository;

/// Collection holding registered users
pub const USERS_COLLECTION: &str = "users";

/// User repository for record store operations
#[derive(Clone)]
pub struct UserRepository {
    users: Collection,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            users: Collection::new(store, USERS_COLLECTION),
        }
    }

    /// Make the store itself reject duplicate usernames
    pub async fn ensure_indexes(&self, scope: &OperationScope) -> StoreResult<()> {
        self.users.create_unique_index(scope, "username").await
    }

    /// Whether any user already holds `username`
    pub async fn username_exists(
        &self,
        scope: &OperationScope,
        username: &str,
    ) -> StoreResult<bool> {
        let matching = self
            .users
            .find(scope, &filter_eq("username", username))
            .await?;

        Ok(matching.count() >= 1)
    }

    /// Persist a new user
    pub async fn create(
        &self,
        scope: &OperationScope,
        user: &User,
    ) -> StoreResult<InsertOneResult> {
        info!("Creating new user: {}", user.username);

        let document = to_document(user)?;
        self.users.insert_one(scope, document).await
    }

    /// Get all users
    pub async fn get_all(&self, scope: &OperationScope) -> StoreResult<Vec<UserResponse>> {
        let users: Vec<User> = self
            .users
            .find(scope, &Document::new())
            .await?
            .deserialize_all()?;

        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
