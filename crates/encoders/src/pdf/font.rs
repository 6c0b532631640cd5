//! Helvetica metrics and WinAnsi text encoding for the standard Type1 fonts.

/// Advance widths (1/1000 em) of Helvetica for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Width used for characters outside printable ASCII.
const DEFAULT_WIDTH: u16 = 556;

/// Bold glyphs run roughly this much wider than regular ones.
const BOLD_FACTOR: f64 = 1.06;

/// Rendered width of `text` in points.
pub(crate) fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as u32;
            if (32..=126).contains(&code) {
                u32::from(HELVETICA_WIDTHS[(code - 32) as usize])
            } else {
                u32::from(DEFAULT_WIDTH)
            }
        })
        .sum();
    let width = f64::from(units) * size / 1000.0;
    if bold {
        width * BOLD_FACTOR
    } else {
        width
    }
}

/// Shorten `text` with a trailing `...` until it fits `max_width`.
pub(crate) fn fit_text(text: &str, max_width: f64, size: f64, bold: bool) -> String {
    if text_width(text, size, bold) <= max_width {
        return text.to_string();
    }
    let ellipsis = "...";
    let budget = max_width - text_width(ellipsis, size, bold);
    if budget <= 0.0 {
        return String::new();
    }

    let mut fitted = String::new();
    let mut used = 0.0;
    for c in text.chars() {
        let w = text_width(c.encode_utf8(&mut [0u8; 4]), size, bold);
        if used + w > budget {
            break;
        }
        used += w;
        fitted.push(c);
    }
    fitted.push_str(ellipsis);
    fitted
}

/// Encode `text` in WinAnsiEncoding for a literal string operand.
///
/// Control characters become spaces and characters WinAnsi cannot represent
/// become `?`.
pub(crate) fn winansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match winansi_byte(c) {
            Some(b) if b.is_ascii_control() => b' ',
            Some(b) => b,
            None => b'?',
        })
        .collect()
}

fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x00..=0x7F => Some(code as u8),
        0xA0..=0xFF => Some(code as u8),
        _ => match c {
            '€' => Some(0x80),
            '‚' => Some(0x82),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '™' => Some(0x99),
            _ => None,
        },
    }
}
