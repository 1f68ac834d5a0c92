//! Router-level tests driving the passport API through `tower::ServiceExt`
//!
//! Each test builds the full router over an in-memory record store, so no
//! database is required.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use common::{
    error::{StoreError, StoreResult},
    scope::OperationScope,
    store::{
        Collection, Document, DocumentStore, InMemoryDocumentStore, InsertOneResult,
        UpdateResult, filter_eq, to_document,
    },
};
use passport_api::{
    models::Trip,
    repositories::trip::TRIPS_COLLECTION,
    responses::{Envelope, Outcome},
    routes::create_router,
    state::AppState,
};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

async fn app_with(store: InMemoryDocumentStore) -> Router {
    let state = AppState::new(Arc::new(store), Duration::from_secs(10));
    state
        .user_repository
        .ensure_indexes(&state.scope())
        .await
        .unwrap();
    create_router(state)
}

async fn seed_trip(store: &InMemoryDocumentStore) -> Trip {
    let trip = Trip {
        id: Uuid::new_v4(),
        country: "IT".to_string(),
        favorite: true,
        favorite_thing: "pasta".to_string(),
    };
    Collection::new(Arc::new(store.clone()), TRIPS_COLLECTION)
        .insert_one(&OperationScope::default(), to_document(&trip).unwrap())
        .await
        .unwrap();
    trip
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Envelope<Value>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let envelope: Envelope<Value> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(envelope.status, status.as_u16());
    (status, envelope)
}

fn register_body(username: &str) -> Value {
    json!({"username": username, "password": "correct horse"})
}

fn register_request(username: &str) -> Request<Body> {
    json_request("POST", "/register", register_body(username))
}

#[tokio::test]
async fn test_register_creates_user() {
    let store = InMemoryDocumentStore::new();
    let app = app_with(store.clone()).await;

    let (status, envelope) = send(&app, register_request("ana")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(envelope.message, Outcome::Success);

    let inserted_id = envelope.data.data["inserted_id"].as_str().unwrap();
    assert!(Uuid::parse_str(inserted_id).is_ok());

    let stored = store.find("users", &filter_eq("username", "ana")).await.unwrap();
    assert_eq!(stored.len(), 1);
    let hash = stored[0]["password_hash"].as_str().unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(stored[0].get("password").is_none());
}

#[tokio::test]
async fn test_register_accepts_short_and_punctuated_values() {
    let store = InMemoryDocumentStore::new();
    let app = app_with(store.clone()).await;

    let body = json!({"username": "jo", "password": "pw"});
    let (status, _) = send(&app, json_request("POST", "/register", body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let body = json!({"username": "ana.maria", "password": "secret"});
    let (status, _) = send(&app, json_request("POST", "/register", body)).await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(store.count("users").await, 2);
}

#[tokio::test]
async fn test_register_rejects_taken_username() {
    let store = InMemoryDocumentStore::new();
    let app = app_with(store.clone()).await;

    send(&app, register_request("ana")).await;
    let (status, envelope) = send(&app, register_request("ana")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope.data.data, json!("Username taken"));
    assert_eq!(store.count("users").await, 1);
}

#[tokio::test]
async fn test_register_rejects_missing_field() {
    let store = InMemoryDocumentStore::new();
    let app = app_with(store.clone()).await;

    let (status, envelope) =
        send(&app, json_request("POST", "/register", json!({"username": "ana"}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope.message, Outcome::Error);
    assert!(envelope.data.data.as_str().unwrap().contains("password"));
    assert_eq!(store.count("users").await, 0);
}

#[tokio::test]
async fn test_register_rejects_malformed_body() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, envelope) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(envelope.data.data.is_string());
}

#[tokio::test]
async fn test_register_without_content_type_is_bad_request() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let request = Request::builder()
        .method("POST")
        .uri("/register")
        .body(Body::from(register_body("ana").to_string()))
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_concurrent_duplicate_registrations_admit_one() {
    let store = InMemoryDocumentStore::new();
    let app = app_with(store.clone()).await;

    let (first, second) = tokio::join!(
        send(&app, register_request("racer")),
        send(&app, register_request("racer")),
    );

    let mut statuses = vec![first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(store.count("users").await, 1);
}

#[tokio::test]
async fn test_list_users_returns_every_user_without_hashes() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    for name in ["ana", "bo", "cy"] {
        send(&app, register_request(name)).await;
    }

    let (status, envelope) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::OK);

    let users = envelope.data.data.as_array().unwrap();
    assert_eq!(users.len(), 3);
    let mut names: Vec<&str> = users
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["ana", "bo", "cy"]);
    assert!(users.iter().all(|u| u.get("password_hash").is_none()));
}

#[tokio::test]
async fn test_list_users_empty() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let (status, envelope) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope.data.data, json!([]));
}

#[tokio::test]
async fn test_get_trip_returns_stored_fields() {
    let store = InMemoryDocumentStore::new();
    let trip = seed_trip(&store).await;
    let app = app_with(store).await;

    let (status, envelope) = send(&app, get(&format!("/trip/{}", trip.id))).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Trip = serde_json::from_value(envelope.data.data).unwrap();
    assert_eq!(fetched, trip);
}

#[tokio::test]
async fn test_get_trip_with_invalid_id_is_bad_request() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let (status, envelope) = send(&app, get("/trip/not-an-id")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(envelope.data.data, json!("invalid trip id: not-an-id"));
}

#[tokio::test]
async fn test_get_unknown_trip_is_store_error() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let (status, envelope) = send(&app, get(&format!("/trip/{}", Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope.data.data, json!("no document matched the filter"));
}

#[tokio::test]
async fn test_edit_trip_updates_only_given_fields() {
    let store = InMemoryDocumentStore::new();
    let trip = seed_trip(&store).await;
    let app = app_with(store).await;

    let uri = format!("/trip/{}", trip.id);
    let (status, envelope) = send(&app, json_request("PUT", &uri, json!({"country": "FR"}))).await;
    assert_eq!(status, StatusCode::OK);

    let updated: Trip = serde_json::from_value(envelope.data.data).unwrap();
    assert_eq!(updated.country, "FR");
    assert_eq!(updated.favorite, trip.favorite);
    assert_eq!(updated.favorite_thing, trip.favorite_thing);

    let (_, envelope) = send(&app, get(&uri)).await;
    let fetched: Trip = serde_json::from_value(envelope.data.data).unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn test_edit_trip_accepts_fetched_trip_sent_back() {
    let store = InMemoryDocumentStore::new();
    let trip = seed_trip(&store).await;
    let app = app_with(store).await;
    let uri = format!("/trip/{}", trip.id);

    let (_, fetched) = send(&app, get(&uri)).await;
    let mut body = fetched.data.data;
    body["favorite_thing"] = json!("gelato");

    let (status, envelope) = send(&app, json_request("PUT", &uri, body)).await;
    assert_eq!(status, StatusCode::OK);
    let updated: Trip = serde_json::from_value(envelope.data.data).unwrap();
    assert_eq!(updated.id, trip.id);
    assert_eq!(updated.country, trip.country);
    assert_eq!(updated.favorite_thing, "gelato");
}

#[tokio::test]
async fn test_edit_unknown_trip_returns_empty_payload() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let uri = format!("/trip/{}", Uuid::new_v4());

    let (status, envelope) =
        send(&app, json_request("PUT", &uri, json!({"favorite": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(envelope.data.data, json!({}));
}

#[tokio::test]
async fn test_edit_trip_rejects_empty_and_foreign_fields() {
    let store = InMemoryDocumentStore::new();
    let trip = seed_trip(&store).await;
    let app = app_with(store).await;
    let uri = format!("/trip/{}", trip.id);

    let (status, _) = send(&app, json_request("PUT", &uri, json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("PUT", &uri, json!({"owner": "mallory"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        send(&app, json_request("PUT", "/trip/zero", json!({"country": "FR"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(InMemoryDocumentStore::new()).await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
}

/// Store whose every call fails, as an unreachable database would
struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn find(&self, _: &str, _: &Document) -> StoreResult<Vec<Document>> {
        Err(StoreError::Configuration("store unavailable".to_string()))
    }

    async fn find_one(&self, _: &str, _: &Document) -> StoreResult<Option<Document>> {
        Err(StoreError::Configuration("store unavailable".to_string()))
    }

    async fn insert_one(&self, _: &str, _: Document) -> StoreResult<InsertOneResult> {
        Err(StoreError::Configuration("store unavailable".to_string()))
    }

    async fn update_one(&self, _: &str, _: &Document, _: &Document) -> StoreResult<UpdateResult> {
        Err(StoreError::Configuration("store unavailable".to_string()))
    }

    async fn create_unique_index(&self, _: &str, _: &str) -> StoreResult<()> {
        Err(StoreError::Configuration("store unavailable".to_string()))
    }
}

/// Store that never answers within any reasonable deadline
struct StalledStore;

#[async_trait]
impl DocumentStore for StalledStore {
    async fn find(&self, _: &str, _: &Document) -> StoreResult<Vec<Document>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn find_one(&self, _: &str, _: &Document) -> StoreResult<Option<Document>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
    }

    async fn insert_one(&self, _: &str, _: Document) -> StoreResult<InsertOneResult> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(InsertOneResult {
            inserted_id: String::new(),
        })
    }

    async fn update_one(&self, _: &str, _: &Document, _: &Document) -> StoreResult<UpdateResult> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(UpdateResult::default())
    }

    async fn create_unique_index(&self, _: &str, _: &str) -> StoreResult<()> {
        Ok(())
    }
}

/// In-memory store whose `find` answers late, so concurrent existence
/// checks all see the collection before any insert lands
#[derive(Clone)]
struct LaggingFindStore {
    inner: InMemoryDocumentStore,
}

#[async_trait]
impl DocumentStore for LaggingFindStore {
    async fn find(&self, collection: &str, filter: &Document) -> StoreResult<Vec<Document>> {
        let documents = self.inner.find(collection, filter).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(documents)
    }

    async fn find_one(&self, collection: &str, filter: &Document) -> StoreResult<Option<Document>> {
        self.inner.find_one(collection, filter).await
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> StoreResult<InsertOneResult> {
        self.inner.insert_one(collection, document).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        set: &Document,
    ) -> StoreResult<UpdateResult> {
        self.inner.update_one(collection, filter, set).await
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        self.inner.create_unique_index(collection, field).await
    }
}

#[tokio::test]
async fn test_unique_index_rejects_registration_that_passed_existence_check() {
    let inner = InMemoryDocumentStore::new();
    let state = AppState::new(
        Arc::new(LaggingFindStore {
            inner: inner.clone(),
        }),
        Duration::from_secs(10),
    );
    state
        .user_repository
        .ensure_indexes(&state.scope())
        .await
        .unwrap();
    let app = create_router(state);

    let (first, second) = tokio::join!(
        send(&app, register_request("racer")),
        send(&app, register_request("racer")),
    );

    let mut outcomes = vec![first, second];
    outcomes.sort_by_key(|(status, _)| *status);
    assert_eq!(outcomes[0].0, StatusCode::CREATED);
    assert_eq!(outcomes[1].0, StatusCode::BAD_REQUEST);
    assert_eq!(outcomes[1].1.data.data, json!("Username taken"));
    assert_eq!(inner.count("users").await, 1);
}

#[tokio::test]
async fn test_existence_check_failure_is_internal_error() {
    let app = create_router(AppState::new(Arc::new(FailingStore), Duration::from_secs(10)));

    let (status, envelope) = send(&app, register_request("ana")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        envelope.data.data,
        json!("store configuration error: store unavailable")
    );

    // The service keeps answering after the failure
    let (status, _) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let app = create_router(AppState::new(
        Arc::new(StalledStore),
        Duration::from_millis(50),
    ));

    let (status, envelope) = send(&app, get("/users")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(envelope.data.data, json!("operation timed out after 50ms"));
}
