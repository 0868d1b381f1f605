use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::DiagramId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Owner and title are required")]
    MissingRequiredField(&'static str),
}

/// Stroke data exactly as a client submitted it, serialized once on the way into storage.
///
/// The server never looks inside; it only decodes the blob again when a single diagram is read
/// back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokeBlob(String);

impl StrokeBlob {
    pub fn encode(strokes: &Value) -> Self {
        StrokeBlob(strokes.to_string())
    }

    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.0)
    }
}

/// A validated request to store a diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiagram {
    pub owner: String,
    pub title: String,
    pub strokes: StrokeBlob,
    pub is_shared: bool,
}

impl NewDiagram {
    pub fn new(
        owner: impl Into<String>,
        title: impl Into<String>,
        strokes: &Value,
        is_shared: bool,
    ) -> Result<Self, ValidationError> {
        let owner = owner.into();
        let title = title.into();
        if owner.is_empty() {
            return Err(ValidationError::MissingRequiredField("owner"));
        }
        if title.is_empty() {
            return Err(ValidationError::MissingRequiredField("title"));
        }
        Ok(Self {
            owner,
            title,
            strokes: StrokeBlob::encode(strokes),
            is_shared,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub id: DiagramId,
    pub title: String,
    pub owner: String,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub strokes: Value,
}

/// Listing view of a diagram; carries no stroke data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSummary {
    pub id: DiagramId,
    pub title: String,
    pub owner: String,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
}
