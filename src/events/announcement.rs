//! CMS announcement: free-form content broadcast to topic destinations.

use std::collections::HashMap;

use serde_json::Value;

use super::as_object;
use crate::error::RelayError;

/// Validated announcement payload.
#[derive(Debug, Clone)]
pub struct Announcement {
    /// Announcement body, default-locale text.
    pub content: String,
    /// Target topic name; `None` broadcasts to every enabled destination.
    pub topic_name: Option<String>,
    /// Optional image URL attached to the announcement.
    pub image: Option<String>,
    /// Pre-translated bodies keyed by locale tag.
    pub translations: Option<HashMap<String, String>>,
}

impl Announcement {
    /// Parses and validates a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Validation`] when `content` is absent or empty.
    pub fn parse(value: &Value) -> Result<Self, RelayError> {
        let obj = as_object(value)?;

        let content = obj
            .get("content")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::Validation("content is required".to_string()))?
            .to_string();

        let topic_name = obj
            .get("topic_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let image = obj
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let translations = obj.get("translations").and_then(Value::as_object).map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        });

        Ok(Self {
            content,
            topic_name,
            image,
            translations,
        })
    }
}
