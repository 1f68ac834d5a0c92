//! Passport API service
//!
//! REST endpoints for user registration and trip records, persisted through
//! the record store adapter from the `common` crate.

pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod repositories;
pub mod responses;
pub mod routes;
pub mod state;
pub mod validation;
