//! Common library for the passport service
//!
//! This crate holds the request workflow pieces shared by the HTTP layer:
//! the record store adapter and its backends, the bounded operation scope
//! every store call runs under, database connectivity, and error types.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use common::scope::OperationScope;
//! use common::store::{Collection, InMemoryDocumentStore, filter_eq};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let users = Collection::new(Arc::new(InMemoryDocumentStore::new()), "users");
//!     let scope = OperationScope::default();
//!     let taken = users.find(&scope, &filter_eq("username", "ana")).await?;
//!     println!("matches: {}", taken.count());
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod scope;
pub mod store;
