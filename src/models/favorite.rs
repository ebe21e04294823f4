use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a JSON value was refused as a favorite record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("favorite record must be a JSON object")]
    NotAnObject,
    #[error("favorite record has no string `url` field")]
    MissingUrl,
    #[error("favorite record has an empty `url`")]
    EmptyUrl,
}

/// One bookmarked site. `url` is the identity key, everything else
/// (title, tags, ...) is carried through untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Favorite {
    pub url: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Favorite {
    pub fn new(url: impl Into<String>) -> Self {
        Favorite {
            url: url.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get("title").and_then(Value::as_str)
    }

    /// Checks the shape of an untyped record before it may enter the store.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(RecordError::NotAnObject),
        };
        let url = match object.remove("url") {
            Some(Value::String(url)) => url,
            _ => return Err(RecordError::MissingUrl),
        };
        if url.trim().is_empty() {
            return Err(RecordError::EmptyUrl);
        }
        Ok(Favorite { url, fields: object })
    }
}

// test module
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_keeps_extra_fields() {
        let record = Favorite::from_value(json!({
            "title": "Rust",
            "url": "https://rust-lang.org",
            "tags": ["lang", "systems"]
        }))
        .unwrap();
        assert_eq!(record.url, "https://rust-lang.org");
        assert_eq!(record.title(), Some("Rust"));
        assert_eq!(record.fields["tags"], json!(["lang", "systems"]));
        assert!(!record.fields.contains_key("url"));
    }

    #[test]
    fn test_from_value_rejects_bad_shapes() {
        assert_eq!(Favorite::from_value(json!("https://a.com")), Err(RecordError::NotAnObject));
        assert_eq!(Favorite::from_value(json!({"title": "no url"})), Err(RecordError::MissingUrl));
        assert_eq!(Favorite::from_value(json!({"url": 42})), Err(RecordError::MissingUrl));
        assert_eq!(Favorite::from_value(json!({"url": "  "})), Err(RecordError::EmptyUrl));
    }

    #[test]
    fn test_serialized_form_is_flat() {
        let record = Favorite::new("http://a.com").with_field("title", "A");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"url": "http://a.com", "title": "A"}));
    }

    #[test]
    fn test_deserialize_requires_url() {
        let result: Result<Favorite, _> = serde_json::from_str(r#"{"title":"x"}"#);
        assert!(result.is_err());
    }
}
