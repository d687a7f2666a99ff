use serde_json::Value;

use crate::error::SepiaError;
use crate::Result;

/// Internal document identity: a monotonically assigned 32-bit sequence id
pub type SeqId = u32;

/// A validated document payload
///
/// Documents are JSON objects with a required string `title` (the indexed
/// field), a required non-negative integer `points` (the static score), and
/// an optional string `id`. Unknown fields are carried through untouched and
/// come back verbatim in search results.
#[derive(Clone, Debug)]
pub struct Document {
    value: Value,
    points: u32,
}

impl Document {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SepiaError::BadDocument(format!("invalid json: {}", e)))?;

        let object = value
            .as_object()
            .ok_or_else(|| SepiaError::BadDocument("document must be a json object".to_string()))?;

        match object.get("title") {
            Some(Value::String(_)) => {}
            Some(_) => {
                return Err(SepiaError::BadDocument(
                    "`title` must be a string".to_string(),
                ))
            }
            None => return Err(SepiaError::BadDocument("`title` is required".to_string())),
        }

        let points = object
            .get("points")
            .ok_or_else(|| SepiaError::BadDocument("`points` is required".to_string()))?
            .as_u64()
            .and_then(|p| u32::try_from(p).ok())
            .ok_or_else(|| {
                SepiaError::BadDocument("`points` must be a non-negative 32-bit integer".to_string())
            })?;

        if let Some(id) = object.get("id") {
            if !id.is_string() {
                return Err(SepiaError::BadDocument("`id` must be a string".to_string()));
            }
        }

        Ok(Self { value, points })
    }

    /// The indexed title field
    pub fn title(&self) -> &str {
        // Validated in from_json
        self.value["title"].as_str().unwrap_or_default()
    }

    /// The static score
    pub fn points(&self) -> u32 {
        self.points
    }

    /// The user-visible id, when one was supplied
    pub fn id(&self) -> Option<&str> {
        self.value.get("id").and_then(Value::as_str)
    }

    /// Assign an id to a document that arrived without one
    pub fn set_id(&mut self, id: String) {
        if let Some(object) = self.value.as_object_mut() {
            object.insert("id".to_string(), Value::String(id));
        }
    }

    /// Serialize back to JSON text for the store
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }
}
