use serde_json::Value;

use crate::error::{EngineError, Result};

/// Accept raw bytes as pipeline input only if they are valid UTF-8.
pub fn text_from_bytes(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| EngineError::InvalidInput(format!("input is not valid UTF-8: {}", e)))
}

/// Extract the text of one request: a JSON string or an object with a
/// string `text` field.
pub fn text_from_json(value: &Value) -> Result<&str> {
    match value {
        Value::String(s) => Ok(s),
        Value::Object(map) => match map.get("text") {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(EngineError::InvalidInput(format!(
                "`text` must be a string, got {}",
                kind(other)
            ))),
            None => Err(EngineError::InvalidInput(
                "object has no `text` field".to_string(),
            )),
        },
        other => Err(EngineError::InvalidInput(format!(
            "expected a string, got {}",
            kind(other)
        ))),
    }
}

/// Split a batch document into per-request inputs. A top-level array is one
/// request per element; anything else is a single request.
pub fn batch_from_json(doc: &Value) -> Vec<Result<&str>> {
    match doc {
        Value::Array(items) => items.iter().map(text_from_json).collect(),
        single => vec![text_from_json(single)],
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_and_text_objects_are_accepted() {
        assert_eq!(text_from_json(&json!("hi")).unwrap(), "hi");
        assert_eq!(text_from_json(&json!({"text": ""})).unwrap(), "");
    }

    #[test]
    fn non_strings_are_rejected() {
        for bad in [json!(null), json!(5), json!({"text": 5}), json!({"body": "x"})] {
            assert!(matches!(
                text_from_json(&bad),
                Err(EngineError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn batch_reports_each_item() {
        let doc = json!(["fine", null, {"text": "also fine"}]);
        let items = batch_from_json(&doc);
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
        assert_eq!(items[2].as_ref().unwrap(), &"also fine");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(text_from_bytes(&[0x66, 0x6f, 0xff]).is_err());
        assert_eq!(text_from_bytes(b"ok").unwrap(), "ok");
    }
}
