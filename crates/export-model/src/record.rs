//! Dataset rows and cell coercion.
//!
//! A record is a JSON object whose key order is preserved exactly as it was
//! built or parsed. Every encoder reads cells through the helpers here so a
//! missing key and an explicit `null` render identically.

use serde_json::{Map, Value};

/// One logical row of an exported dataset.
pub type Record = Map<String, Value>;

/// Look up a cell by column key.
pub fn cell<'a>(record: &'a Record, key: &str) -> Option<&'a Value> {
    record.get(key)
}

/// Coerce a cell to the text shown in display-oriented formats.
///
/// Strings are returned verbatim, numbers and booleans use their JSON text,
/// `null` becomes empty, and nested arrays/objects are rendered as compact JSON.
pub fn display_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Parse a JSON document into records.
///
/// Accepts either a top-level array of objects or an object wrapping one
/// under a `data` key (the shape the dashboard API returns).
pub fn parse_records(json: &str) -> Result<Vec<Record>, RecordParseError> {
    let value: Value = serde_json::from_str(json)?;
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => return Err(RecordParseError::NotAnArray),
        },
        _ => return Err(RecordParseError::NotAnArray),
    };

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| match row {
            Value::Object(record) => Ok(record),
            _ => Err(RecordParseError::NotAnObject { index }),
        })
        .collect()
}

/// Errors raised while loading a dataset from JSON.
#[derive(Debug, thiserror::Error)]
pub enum RecordParseError {
    #[error("Dataset must be a JSON array of objects (or an object with a `data` array)")]
    NotAnArray,

    #[error("Dataset row {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_text_coercion() {
        assert_eq!(display_text(None), "");
        assert_eq!(display_text(Some(&Value::Null)), "");
        assert_eq!(display_text(Some(&json!("Truck-1"))), "Truck-1");
        assert_eq!(display_text(Some(&json!(500))), "500");
        assert_eq!(display_text(Some(&json!(12.5))), "12.5");
        assert_eq!(display_text(Some(&json!(true))), "true");
        assert_eq!(display_text(Some(&json!(["a", 1]))), r#"["a",1]"#);
    }

    #[test]
    fn test_parse_records_preserves_key_order() {
        let records = parse_records(r#"[{"plate":"AB-12","km":500,"driver":"Ana"}]"#).unwrap();
        let keys: Vec<&str> = records[0].keys().map(String::as_str).collect();
        assert_eq!(keys, ["plate", "km", "driver"]);
    }

    #[test]
    fn test_parse_records_accepts_data_envelope() {
        let records = parse_records(r#"{"data":[{"id":1},{"id":2}],"total":2}"#).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_parse_records_rejects_scalar_rows() {
        let err = parse_records(r#"[{"id":1}, 7]"#).unwrap_err();
        assert!(matches!(err, RecordParseError::NotAnObject { index: 1 }));
    }
}
