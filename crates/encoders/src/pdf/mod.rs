//! Paginated printable document export.
//!
//! Renders the projection as a table: a filled header row followed by one
//! row per record, flowing onto as many pages as needed. The header row is
//! repeated at the top of every page and body rows are optionally striped.
//!
//! Header rows are wrapped in `/THead` marked content and body rows in `/TR`,
//! which keeps the structure recoverable from the content streams.

mod content;
mod font;

use std::ops::Range;

use fleetdash_common::config::PdfDefaults;
use fleetdash_common::error::{FleetdashError, FleetdashResult};
use fleetdash_export_model::{cell, display_text, ColumnDescriptor, Record};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

use content::{real, PageContent, Rgb};
use font::fit_text;

const CELL_PADDING: f64 = 4.0;
const ROW_HEIGHT_FACTOR: f64 = 2.0;
const STRIPE_FILL: Rgb = Rgb(0.961, 0.965, 0.973);
const BODY_TEXT: Rgb = Rgb(0.2, 0.2, 0.2);
const RULE_GRAY: f64 = 0.85;

/// Page geometry and table styling.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub page_width_pt: f64,
    pub page_height_pt: f64,
    pub margin_pt: f64,
    pub font_size_pt: f64,
    /// Header background as `#rrggbb`.
    pub header_fill: String,
    pub striped: bool,
}

impl Default for PdfLayout {
    fn default() -> Self {
        Self::from(&PdfDefaults::default())
    }
}

impl From<&PdfDefaults> for PdfLayout {
    fn from(defaults: &PdfDefaults) -> Self {
        Self {
            page_width_pt: defaults.page_width_pt,
            page_height_pt: defaults.page_height_pt,
            margin_pt: defaults.margin_pt,
            font_size_pt: defaults.font_size_pt,
            header_fill: defaults.header_fill.clone(),
            striped: defaults.striped,
        }
    }
}

impl PdfLayout {
    fn row_height(&self) -> f64 {
        self.font_size_pt * ROW_HEIGHT_FACTOR
    }

    fn table_width(&self) -> f64 {
        self.page_width_pt - 2.0 * self.margin_pt
    }

    /// Body rows that fit under the header on one page (at least one).
    pub fn rows_per_page(&self) -> usize {
        let row_h = self.row_height();
        let usable = self.page_height_pt - 2.0 * self.margin_pt - row_h;
        ((usable / row_h).floor() as usize).max(1)
    }

    fn validate(&self) -> FleetdashResult<Rgb> {
        if !(self.font_size_pt > 0.0) {
            return Err(FleetdashError::encoding(
                "pdf",
                format!("font size must be positive, got {}", self.font_size_pt),
            ));
        }
        if !(self.table_width() > 0.0)
            || !(self.page_height_pt - 2.0 * self.margin_pt > self.row_height())
        {
            return Err(FleetdashError::encoding(
                "pdf",
                format!(
                    "page {}x{}pt leaves no room for a table with {}pt margins",
                    self.page_width_pt, self.page_height_pt, self.margin_pt
                ),
            ));
        }
        Rgb::from_hex(&self.header_fill).ok_or_else(|| {
            FleetdashError::encoding(
                "pdf",
                format!("header fill {:?} is not a #rrggbb color", self.header_fill),
            )
        })
    }
}

/// Split `record_count` body rows into per-page ranges.
///
/// An empty dataset still produces one (header-only) page.
pub fn paginate(record_count: usize, rows_per_page: usize) -> Vec<Range<usize>> {
    if record_count == 0 {
        return vec![0..0];
    }
    let per_page = rows_per_page.max(1);
    (0..record_count)
        .step_by(per_page)
        .map(|start| start..(start + per_page).min(record_count))
        .collect()
}

/// Build the document.
pub fn encode(
    records: &[Record],
    projection: &[ColumnDescriptor],
    options: &crate::EncodeOptions,
) -> FleetdashResult<Vec<u8>> {
    let layout = &options.pdf;
    let header_fill = layout.validate()?;

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(font_dict("Helvetica"));
    let bold_id = doc.add_object(font_dict("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for rows in paginate(records.len(), layout.rows_per_page()) {
        let content = render_page(records, projection, rows, layout, header_fill);
        let encoded = content
            .encode()
            .map_err(|e| FleetdashError::encoding("pdf", format!("content stream: {e}")))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                real(0.0),
                real(0.0),
                real(layout.page_width_pt),
                real(layout.page_height_pt),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| FleetdashError::encoding("pdf", format!("write document: {e}")))?;
    Ok(bytes)
}

fn font_dict(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn render_page(
    records: &[Record],
    projection: &[ColumnDescriptor],
    rows: Range<usize>,
    layout: &PdfLayout,
    header_fill: Rgb,
) -> Content {
    let row_h = layout.row_height();
    let size = layout.font_size_pt;
    let left = layout.margin_pt;
    let table_w = layout.table_width();
    let col_w = table_w / projection.len().max(1) as f64;
    let text_w = (col_w - 2.0 * CELL_PADDING).max(0.0);
    let baseline = (row_h - size) / 2.0 + size * 0.22;

    let mut content = PageContent::new();
    let mut top = layout.page_height_pt - layout.margin_pt;

    content.begin_marked("THead");
    content.fill_rect(left, top - row_h, table_w, row_h, header_fill);
    for (i, col) in projection.iter().enumerate() {
        let text = fit_text(&col.header, text_w, size, true);
        content.text(
            "F2",
            size,
            left + i as f64 * col_w + CELL_PADDING,
            top - row_h + baseline,
            Rgb::WHITE,
            &text,
        );
    }
    content.end_marked();
    top -= row_h;

    for index in rows {
        let record = &records[index];
        let bottom = top - row_h;
        content.begin_marked("TR");
        if layout.striped && index % 2 == 1 {
            content.fill_rect(left, bottom, table_w, row_h, STRIPE_FILL);
        }
        for (i, col) in projection.iter().enumerate() {
            let text = display_text(cell(record, &col.key));
            if text.is_empty() {
                continue;
            }
            let text = fit_text(&text, text_w, size, false);
            content.text(
                "F1",
                size,
                left + i as f64 * col_w + CELL_PADDING,
                bottom + baseline,
                BODY_TEXT,
                &text,
            );
        }
        content.line((left, bottom), (left + table_w, bottom), RULE_GRAY, 0.5);
        content.end_marked();
        top = bottom;
    }

    content.into_content()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EncodeOptions;
    use fleetdash_export_model::resolve;
    use lopdf::content::Operation;
    use serde_json::json;

    fn fleet(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                json!({"plate": format!("FL-{i:03}"), "km": i * 10})
                    .as_object()
                    .cloned()
                    .unwrap()
            })
            .collect()
    }

    fn page_operations(bytes: &[u8]) -> Vec<Vec<Operation>> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let raw = doc.get_page_content(page_id).unwrap();
                Content::decode(&raw).unwrap().operations
            })
            .collect()
    }

    fn marked(ops: &[Operation], tag: &str) -> usize {
        ops.iter()
            .filter(|op| op.operator == "BMC")
            .filter(|op| matches!(op.operands.first(), Some(Object::Name(n)) if n == tag.as_bytes()))
            .count()
    }

    fn shown_text(ops: &[Operation]) -> Vec<String> {
        ops.iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_paginate_splits_rows() {
        assert_eq!(paginate(0, 10), vec![0..0]);
        assert_eq!(paginate(3, 10), vec![0..3]);
        assert_eq!(paginate(25, 10), vec![0..10, 10..20, 20..25]);
    }

    #[test]
    fn test_rows_per_page_for_default_a4() {
        let layout = PdfLayout::default();
        // (841.89 - 80 - 18) / 18
        assert_eq!(layout.rows_per_page(), 41);
    }

    #[test]
    fn test_header_repeats_on_every_page() {
        let records = fleet(100);
        let projection = resolve(&records, None);
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let pages = page_operations(&bytes);

        assert_eq!(pages.len(), 3);
        for ops in &pages {
            assert_eq!(marked(ops, "THead"), 1);
            let text = shown_text(ops);
            assert_eq!(&text[..2], ["plate", "km"]);
        }
        let rows: usize = pages.iter().map(|ops| marked(ops, "TR")).sum();
        assert_eq!(rows, 100);
        assert_eq!(marked(&pages[0], "TR"), 41);
    }

    #[test]
    fn test_body_cells_follow_projection_order() {
        let records = fleet(1);
        let projection = vec![
            ColumnDescriptor::new("km", "Odometer"),
            ColumnDescriptor::new("plate", "Plate"),
        ];
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let pages = page_operations(&bytes);
        assert_eq!(shown_text(&pages[0]), ["Odometer", "Plate", "0", "FL-000"]);
    }

    #[test]
    fn test_parentheses_survive_in_cells() {
        let records = vec![json!({"note": "left (rear)"}).as_object().cloned().unwrap()];
        let projection = resolve(&records, None);
        let bytes = encode(&records, &projection, &EncodeOptions::default()).unwrap();
        let pages = page_operations(&bytes);
        assert_eq!(shown_text(&pages[0]), ["note", "left (rear)"]);
    }

    #[test]
    fn test_document_carries_no_info_dictionary() {
        let bytes = encode(&fleet(2), &resolve(&fleet(2), None), &EncodeOptions::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.trailer.get(b"Info").is_err());
        assert!(doc.trailer.get(b"ID").is_err());
    }

    #[test]
    fn test_invalid_header_fill_is_encoding_error() {
        let mut options = EncodeOptions::default();
        options.pdf.header_fill = "sky blue".to_string();
        let err = encode(&[], &[], &options).unwrap_err();
        assert!(matches!(err, FleetdashError::Encoding { .. }));
    }

    #[test]
    fn test_margins_larger_than_page_are_rejected() {
        let mut options = EncodeOptions::default();
        options.pdf.margin_pt = 400.0;
        assert!(encode(&[], &[], &options).is_err());
    }
}
