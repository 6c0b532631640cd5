//! Legacy rich-text export: an HTML table saved with a `.doc` extension,
//! which word processors open as a document.
//!
//! This encoder does not use the column projection. Headers are the first
//! record's raw keys and each row lists the record's own values in its own
//! key order. Existing exports depend on that layout, so caller-supplied
//! columns are ignored here.

use fleetdash_common::error::FleetdashResult;
use fleetdash_export_model::{ColumnDescriptor, Record};
use quick_xml::escape::escape;
use serde_json::Value;

use crate::EncodeOptions;

/// Build the markup document.
pub fn encode(
    records: &[Record],
    _projection: &[ColumnDescriptor],
    _options: &EncodeOptions,
) -> FleetdashResult<Vec<u8>> {
    let mut out = String::from(
        "<html><head><meta charset=\"utf-8\"></head><body><table border=\"1\"><tr>",
    );
    if let Some(first) = records.first() {
        for key in first.keys() {
            out.push_str(&format!("<th>{}</th>", escape(key.as_str())));
        }
    }
    out.push_str("</tr>");

    for record in records {
        out.push_str("<tr>");
        for value in record.values() {
            out.push_str(&format!("<td>{}</td>", escape(raw_text(value).as_str())));
        }
        out.push_str("</tr>");
    }

    out.push_str("</table></body></html>");
    Ok(out.into_bytes())
}

/// Text of a raw value as the legacy export wrote it.
///
/// `null` is spelled out, arrays are joined with commas (their null items
/// left empty) and objects collapse to `[object Object]`.
fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => raw_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn encode_text(records: &[Record], projection: &[ColumnDescriptor]) -> String {
        String::from_utf8(encode(records, projection, &EncodeOptions::default()).unwrap())
            .unwrap()
    }

    #[test]
    fn test_doc_escapes_markup_in_values() {
        let records = vec![record(json!({"note": "<b>&</b>"}))];
        let text = encode_text(&records, &[]);
        assert!(text.contains("<td>&lt;b&gt;&amp;&lt;/b&gt;</td>"));
        assert!(!text.contains("<b>"));
    }

    #[test]
    fn test_doc_escapes_markup_in_headers() {
        let records = vec![record(json!({"a<b": 1}))];
        let text = encode_text(&records, &[]);
        assert!(text.contains("<th>a&lt;b</th>"));
    }

    #[test]
    fn test_doc_headers_come_from_raw_keys_not_projection() {
        let records = vec![
            record(json!({"name": "Truck-1", "km": 500})),
            record(json!({"name": "Van-2", "km": 120})),
        ];
        let projection = vec![ColumnDescriptor::new("km", "Odometer (km)")];
        let text = encode_text(&records, &projection);
        assert!(text.contains("<tr><th>name</th><th>km</th></tr>"));
        assert!(text.contains("<tr><td>Truck-1</td><td>500</td></tr>"));
        assert!(text.contains("<tr><td>Van-2</td><td>120</td></tr>"));
        assert!(!text.contains("Odometer"));
    }

    #[test]
    fn test_doc_empty_dataset_has_empty_header_row() {
        let text = encode_text(&[], &[]);
        assert_eq!(
            text,
            "<html><head><meta charset=\"utf-8\"></head><body><table border=\"1\"><tr></tr></table></body></html>"
        );
    }

    #[test]
    fn test_doc_flattens_nested_values() {
        let records = vec![record(json!({
            "tags": ["a", 1, null, ["b", true]],
            "gps": {"lat": 40.4}
        }))];
        let text = encode_text(&records, &[]);
        assert!(text.contains("<td>a,1,,b,true</td>"));
        assert!(text.contains("<td>[object Object]</td>"));
    }

    #[test]
    fn test_doc_spells_out_null() {
        let records = vec![record(json!({"driver": null}))];
        assert!(encode_text(&records, &[]).contains("<td>null</td>"));
    }
}
