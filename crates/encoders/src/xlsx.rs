//! Spreadsheet workbook export (Office Open XML).
//!
//! The package holds a single worksheet. Row 1 carries the projection
//! headers; each record becomes one row below it. Entries are stored
//! uncompressed with a fixed modification time so identical input produces
//! an identical file.

use std::io::{Cursor, Write};

use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_model::{cell, ColumnDescriptor, Record};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::EncodeOptions;

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Excel's per-cell text limit.
const MAX_CELL_CHARS: usize = 32_767;
/// Excel's sheet-name length limit.
const MAX_SHEET_NAME_CHARS: usize = 31;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

// Style 1 is the bold header font.
const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><fonts count="2"><font><sz val="11"/><name val="Calibri"/></font><font><b/><sz val="11"/><name val="Calibri"/></font></fonts><fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills><borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders><cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs><cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/></cellXfs><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;

/// Build the workbook package.
pub fn encode(
    records: &[Record],
    projection: &[ColumnDescriptor],
    options: &EncodeOptions,
) -> FleetdashResult<Vec<u8>> {
    validate_sheet_name(&options.sheet_name)?;

    let workbook = workbook_xml(&options.sheet_name)?;
    let sheet = sheet_xml(records, projection)?;

    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes()),
        ("_rels/.rels", ROOT_RELS_XML.as_bytes()),
        ("xl/workbook.xml", workbook.as_slice()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.as_bytes()),
        ("xl/styles.xml", STYLES_XML.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_slice()),
    ];

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip::DateTime::default());

    for (name, body) in parts {
        zip.start_file(name, file_options).map_err(zip_error)?;
        zip.write_all(body).map_err(zip_error)?;
    }

    let cursor = zip.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}

fn validate_sheet_name(name: &str) -> FleetdashResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_SHEET_NAME_CHARS {
        return Err(FleetdashError::encoding(
            "xlsx",
            format!("sheet name must be 1-{MAX_SHEET_NAME_CHARS} characters, got {len}"),
        ));
    }
    if let Some(bad) = name.chars().find(|c| "[]:*?/\\".contains(*c)) {
        return Err(FleetdashError::encoding(
            "xlsx",
            format!("sheet name {name:?} contains forbidden character {bad:?}"),
        ));
    }
    Ok(())
}

fn workbook_xml(sheet_name: &str) -> FleetdashResult<Vec<u8>> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("workbook");
    root.push_attribute(("xmlns", SPREADSHEET_NS));
    root.push_attribute(("xmlns:r", RELATIONSHIPS_NS));
    xml.write_event(Event::Start(root)).map_err(xml_error)?;
    xml.write_event(Event::Start(BytesStart::new("sheets")))
        .map_err(xml_error)?;

    let mut sheet = BytesStart::new("sheet");
    sheet.push_attribute(("name", sheet_name));
    sheet.push_attribute(("sheetId", "1"));
    sheet.push_attribute(("r:id", "rId1"));
    xml.write_event(Event::Empty(sheet)).map_err(xml_error)?;

    xml.write_event(Event::End(BytesEnd::new("sheets")))
        .map_err(xml_error)?;
    xml.write_event(Event::End(BytesEnd::new("workbook")))
        .map_err(xml_error)?;
    Ok(xml.into_inner())
}

fn sheet_xml(records: &[Record], projection: &[ColumnDescriptor]) -> FleetdashResult<Vec<u8>> {
    let mut xml = Writer::new(Vec::new());
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("worksheet");
    root.push_attribute(("xmlns", SPREADSHEET_NS));
    xml.write_event(Event::Start(root)).map_err(xml_error)?;
    xml.write_event(Event::Start(BytesStart::new("sheetData")))
        .map_err(xml_error)?;

    let headers = projection
        .iter()
        .map(|col| SheetCell::Text(col.header.clone()));
    write_row(&mut xml, 1, headers, true)?;

    for (index, record) in records.iter().enumerate() {
        let cells = projection
            .iter()
            .map(|col| SheetCell::from_value(cell(record, &col.key)));
        write_row(&mut xml, index + 2, cells, false)?;
    }

    xml.write_event(Event::End(BytesEnd::new("sheetData")))
        .map_err(xml_error)?;
    xml.write_event(Event::End(BytesEnd::new("worksheet")))
        .map_err(xml_error)?;
    Ok(xml.into_inner())
}

/// A typed worksheet cell.
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Empty,
    Number(String),
    Bool(bool),
    Text(String),
}

impl SheetCell {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SheetCell::Empty,
            Some(Value::Bool(b)) => SheetCell::Bool(*b),
            Some(Value::Number(n)) => SheetCell::Number(n.to_string()),
            Some(Value::String(s)) => SheetCell::Text(s.clone()),
            Some(other) => SheetCell::Text(other.to_string()),
        }
    }
}

fn write_row(
    xml: &mut Writer<Vec<u8>>,
    row_number: usize,
    cells: impl Iterator<Item = SheetCell>,
    header: bool,
) -> FleetdashResult<()> {
    let row_ref = row_number.to_string();
    let mut row = BytesStart::new("row");
    row.push_attribute(("r", row_ref.as_str()));
    xml.write_event(Event::Start(row)).map_err(xml_error)?;

    for (col_index, value) in cells.enumerate() {
        let (type_attr, body) = match value {
            SheetCell::Empty => continue,
            SheetCell::Number(n) => (None, n),
            SheetCell::Bool(b) => (Some("b"), if b { "1" } else { "0" }.to_string()),
            SheetCell::Text(s) => {
                if s.chars().count() > MAX_CELL_CHARS {
                    return Err(FleetdashError::encoding(
                        "xlsx",
                        format!(
                            "cell {}{row_number} exceeds {MAX_CELL_CHARS} characters",
                            column_name(col_index)
                        ),
                    ));
                }
                (Some("inlineStr"), s)
            }
        };

        let cell_ref = format!("{}{row_number}", column_name(col_index));
        let mut c = BytesStart::new("c");
        c.push_attribute(("r", cell_ref.as_str()));
        if header {
            c.push_attribute(("s", "1"));
        }
        if let Some(t) = type_attr {
            c.push_attribute(("t", t));
        }
        xml.write_event(Event::Start(c)).map_err(xml_error)?;

        if type_attr == Some("inlineStr") {
            xml.write_event(Event::Start(BytesStart::new("is")))
                .map_err(xml_error)?;
            let mut t = BytesStart::new("t");
            if body.trim() != body {
                t.push_attribute(("xml:space", "preserve"));
            }
            xml.write_event(Event::Start(t)).map_err(xml_error)?;
            xml.write_event(Event::Text(BytesText::new(&escape_ooxml_text(&body))))
                .map_err(xml_error)?;
            xml.write_event(Event::End(BytesEnd::new("t")))
                .map_err(xml_error)?;
            xml.write_event(Event::End(BytesEnd::new("is")))
                .map_err(xml_error)?;
        } else {
            xml.write_event(Event::Start(BytesStart::new("v")))
                .map_err(xml_error)?;
            xml.write_event(Event::Text(BytesText::new(&body)))
                .map_err(xml_error)?;
            xml.write_event(Event::End(BytesEnd::new("v")))
                .map_err(xml_error)?;
        }

        xml.write_event(Event::End(BytesEnd::new("c")))
            .map_err(xml_error)?;
    }

    xml.write_event(Event::End(BytesEnd::new("row")))
        .map_err(xml_error)?;
    Ok(())
}

/// Encode characters XML 1.0 cannot carry as `_xHHHH_`.
///
/// A literal `_xHHHH_` in the input has its leading underscore written as
/// `_x005F_` so readers do not decode it.
fn escape_ooxml_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        let code = c as u32;
        let forbidden = matches!(code, 0x00..=0x08 | 0x0B | 0x0C | 0x0E..=0x1F | 0xFFFE | 0xFFFF);
        if forbidden || (c == '_' && is_escape_sequence(&text[i..])) {
            out.push_str(&format!("_x{code:04X}_"));
        } else {
            out.push(c);
        }
    }
    out
}

fn is_escape_sequence(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b[1] == b'x'
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}

/// Zero-based column index to spreadsheet letters (0 -> A, 26 -> AA).
fn column_name(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn xml_error(e: impl std::fmt::Display) -> FleetdashError {
    FleetdashError::encoding("xlsx", format!("failed to write sheet XML: {e}"))
}

fn zip_error(e: impl std::fmt::Display) -> FleetdashError {
    FleetdashError::encoding("xlsx", format!("failed to write workbook package: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use fleetdash_export_model::resolve;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_cells_are_typed() {
        let records = vec![record(json!({
            "plate": "AB-12",
            "km": 500,
            "active": true,
            "driver": null,
            "tags": ["ev", "city"]
        }))];
        let projection = resolve(&records, None);
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

        assert!(sheet.contains(r#"<c r="A2" t="inlineStr"><is><t>AB-12</t></is></c>"#));
        assert!(sheet.contains(r#"<c r="B2"><v>500</v></c>"#));
        assert!(sheet.contains(r#"<c r="C2" t="b"><v>1</v></c>"#));
        assert!(!sheet.contains(r#"r="D2""#));
        assert!(sheet.contains(r#"<c r="E2" t="inlineStr">"#));
    }

    #[test]
    fn test_missing_projected_key_is_empty_cell() {
        let records = vec![record(json!({"plate": "AB-12"}))];
        let projection = vec![
            ColumnDescriptor::new("plate", "Plate"),
            ColumnDescriptor::new("vin", "VIN"),
        ];
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<c r="B1" s="1" t="inlineStr"><is><t>VIN</t></is></c>"#));
        assert!(!sheet.contains(r#"r="B2""#));
    }

    #[test]
    fn test_sheet_name_is_written_and_validated() {
        let bytes = encode(&[], &[], &EncodeOptions::default()).unwrap();
        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains(r#"<sheet name="Data" sheetId="1" r:id="rId1"/>"#));

        let options = EncodeOptions {
            sheet_name: "Trips/2026".to_string(),
            ..EncodeOptions::default()
        };
        let err = encode(&[], &[], &options).unwrap_err();
        assert!(matches!(err, FleetdashError::Encoding { .. }));
    }

    #[test]
    fn test_text_with_outer_whitespace_is_preserved() {
        let records = vec![record(json!({"note": " spare tyre "}))];
        let projection = resolve(&records, None);
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<t xml:space="preserve"> spare tyre </t>"#));
    }

    #[test]
    fn test_control_characters_are_escaped() {
        let records = vec![record(json!({"note\u{0001}": "a\u{0001}b\u{001f}", "tab": "a\tb"}))];
        let projection = resolve(&records, None);
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<t>note_x0001_</t>"));
        assert!(sheet.contains("<t>a_x0001_b_x001F_</t>"));
        assert!(sheet.contains("<t>a\tb</t>"));
        assert!(!sheet.contains('\u{0001}'));
    }

    #[test]
    fn test_literal_escape_sequence_is_protected() {
        assert_eq!(escape_ooxml_text("_x0041_"), "_x005F_x0041_");
        assert_eq!(escape_ooxml_text("snake_case_x"), "snake_case_x");
        assert_eq!(escape_ooxml_text("fleet_x12"), "fleet_x12");
    }
}
