//! Passport API routes
//!
//! Every handler runs the same sequence: open the operation scope, decode
//! the body, validate it, talk to the record store, and wrap the outcome in
//! an [`Envelope`].

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use common::{error::StoreError, store::InsertOneResult};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{RegisterRequest, Trip, TripUpdate, User, UserResponse},
    password::hash_password,
    responses::Envelope,
    state::AppState,
    validation::Validate,
};

/// Create the router for the passport API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/register", post(register))
        .route("/users", get(get_all_users))
        .route("/trip/:tripId", get(get_trip).put(edit_trip))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "passport-api"
    }))
}

/// Register a new user
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Envelope<InsertOneResult>> {
    let scope = state.scope();
    let Json(payload) = payload?;
    payload.validate()?;

    if state
        .user_repository
        .username_exists(&scope, &payload.username)
        .await?
    {
        warn!("Registration rejected, username taken: {}", payload.username);
        return Err(ApiError::UsernameTaken);
    }

    let user = User::new(payload.username, hash_password(&payload.password)?);
    let result = state
        .user_repository
        .create(&scope, &user)
        .await
        .map_err(|e| match e {
            StoreError::DuplicateKey(_) => ApiError::UsernameTaken,
            other => ApiError::Store(other),
        })?;

    info!("Registered user {}", result.inserted_id);
    Ok(Envelope::success(StatusCode::CREATED, result))
}

/// Get all users
pub async fn get_all_users(
    State(state): State<AppState>,
) -> ApiResult<Envelope<Vec<UserResponse>>> {
    let scope = state.scope();
    let users = state.user_repository.get_all(&scope).await?;

    Ok(Envelope::success(StatusCode::OK, users))
}

/// Get a trip by ID
pub async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> ApiResult<Envelope<Trip>> {
    let scope = state.scope();
    let id = parse_trip_id(&trip_id)?;
    let trip = state.trip_repository.find_by_id(&scope, id).await?;

    Ok(Envelope::success(StatusCode::OK, trip))
}

/// Partially update a trip
///
/// An ID that matches no trip still answers 200, with an empty object as
/// the payload.
pub async fn edit_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    payload: Result<Json<TripUpdate>, JsonRejection>,
) -> ApiResult<Envelope<Value>> {
    let scope = state.scope();
    let id = parse_trip_id(&trip_id)?;
    let Json(update) = payload?;
    update.validate()?;

    let updated = match state.trip_repository.update(&scope, id, &update).await? {
        Some(trip) => json!(trip),
        None => json!({}),
    };

    Ok(Envelope::success(StatusCode::OK, updated))
}

fn parse_trip_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid trip id: {raw}")))
}
