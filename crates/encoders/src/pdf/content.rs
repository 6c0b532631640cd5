//! Page content streams as `lopdf` operations.

use lopdf::content::{Content, Operation};
use lopdf::Object;

use super::font::winansi_bytes;

/// An RGB color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rgb(pub f64, pub f64, pub f64);

impl Rgb {
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);

    /// Parse `#rrggbb`.
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .ok()
                .map(|v| f64::from(v) / 255.0)
        };
        Some(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    fn operands(self) -> Vec<Object> {
        vec![real(self.0), real(self.1), real(self.2)]
    }
}

pub(crate) fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

/// Accumulates drawing operations for one page.
#[derive(Debug, Default)]
pub(crate) struct PageContent {
    operations: Vec<Operation>,
}

impl PageContent {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    /// Begin a marked-content sequence tagged `tag`.
    pub fn begin_marked(&mut self, tag: &str) {
        self.push("BMC", vec![Object::Name(tag.as_bytes().to_vec())]);
    }

    pub fn end_marked(&mut self) {
        self.push("EMC", vec![]);
    }

    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.push("rg", color.operands());
        self.push("re", vec![real(x), real(y), real(w), real(h)]);
        self.push("f", vec![]);
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), gray: f64, width: f64) {
        self.push("G", vec![real(gray)]);
        self.push("w", vec![real(width)]);
        self.push("m", vec![real(from.0), real(from.1)]);
        self.push("l", vec![real(to.0), real(to.1)]);
        self.push("S", vec![]);
    }

    /// Show `text` at `(x, y)` with font resource `font`.
    pub fn text(&mut self, font: &str, size: f64, x: f64, y: f64, color: Rgb, text: &str) {
        self.push("BT", vec![]);
        self.push("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(size)]);
        self.push("rg", color.operands());
        self.push("Td", vec![real(x), real(y)]);
        self.push("Tj", vec![Object::string_literal(winansi_bytes(text))]);
        self.push("ET", vec![]);
    }

    pub fn into_content(self) -> Content {
        Content {
            operations: self.operations,
        }
    }
}
