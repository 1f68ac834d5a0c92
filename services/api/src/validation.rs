//! Input validation utilities

use std::fmt;

use crate::models::{RegisterRequest, TripUpdate};

/// A single failing field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found while validating one payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` against `field`
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Record the outcome of a field check
    pub fn check(&mut self, field: &'static str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the failing fields, in the order they were checked
    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.iter().map(|e| e.field)
    }

    /// `Ok(())` when nothing was recorded
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Declared field rules for a request payload
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// Require a text field to be present and non-blank
fn validate_required(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("is required".to_string())
    } else {
        Ok(())
    }
}

/// Reject present-but-blank text fields
fn validate_not_blank(value: Option<&str>) -> Result<(), String> {
    match value {
        Some(text) if text.trim().is_empty() => Err("must not be blank".to_string()),
        _ => Ok(()),
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("username", validate_required(&self.username));
        errors.check("password", validate_required(&self.password));
        errors.into_result()
    }
}

impl Validate for TripUpdate {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.is_empty() {
            errors.add(
                "body",
                "at least one of country, favorite, favorite_thing is required",
            );
        }
        errors.check("country", validate_not_blank(self.country.as_deref()));
        errors.check(
            "favorite_thing",
            validate_not_blank(self.favorite_thing.as_deref()),
        );
        errors.into_result()
    }
}
