//! API models for stored records and request payloads

pub mod trip;
pub mod user;

pub use trip::{Trip, TripUpdate};
pub use user::{RegisterRequest, User, UserResponse};
