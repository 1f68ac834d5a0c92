//! Trip model and its partial update payload

use common::store::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Trip record as persisted in the `trips` collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub favorite_thing: String,
}

/// Partial trip update; only the fields present are written
///
/// Keys other than the three editable fields are ignored, so a trip read
/// back from the API can be sent as-is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TripUpdate {
    pub country: Option<String>,
    pub favorite: Option<bool>,
    pub favorite_thing: Option<String>,
}

impl TripUpdate {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.favorite.is_none() && self.favorite_thing.is_none()
    }

    /// The `$set` document for this update
    pub fn changes(&self) -> Document {
        let mut set = Document::new();
        if let Some(country) = &self.country {
            set.insert("country".to_string(), Value::from(country.as_str()));
        }
        if let Some(favorite) = self.favorite {
            set.insert("favorite".to_string(), Value::from(favorite));
        }
        if let Some(favorite_thing) = &self.favorite_thing {
            set.insert("favorite_thing".to_string(), Value::from(favorite_thing.as_str()));
        }
        set
    }
}
