//! Supported export formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every output representation the export menu offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatId {
    Xlsx,
    Pdf,
    Doc,
    Json,
    Image,
    Print,
}

impl FormatId {
    /// Menu order.
    pub const ALL: [FormatId; 6] = [
        FormatId::Xlsx,
        FormatId::Pdf,
        FormatId::Doc,
        FormatId::Json,
        FormatId::Image,
        FormatId::Print,
    ];

    /// Stable identifier used on the command line and in logs.
    pub fn id(self) -> &'static str {
        match self {
            FormatId::Xlsx => "xlsx",
            FormatId::Pdf => "pdf",
            FormatId::Doc => "doc",
            FormatId::Json => "json",
            FormatId::Image => "image",
            FormatId::Print => "print",
        }
    }

    /// Menu label.
    pub fn label(self) -> &'static str {
        match self {
            FormatId::Xlsx => "Excel (XLSX)",
            FormatId::Pdf => "PDF Document",
            FormatId::Doc => "Word (DOC)",
            FormatId::Json => "JSON Format",
            FormatId::Image => "PNG Image",
            FormatId::Print => "Print View",
        }
    }

    /// Canonical file extension. Print produces no file.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FormatId::Xlsx => Some("xlsx"),
            FormatId::Pdf => Some("pdf"),
            FormatId::Doc => Some("doc"),
            FormatId::Json => Some("json"),
            FormatId::Image => Some("png"),
            FormatId::Print => None,
        }
    }

    /// MIME type of the produced artifact.
    pub fn media_type(self) -> Option<&'static str> {
        match self {
            FormatId::Xlsx => {
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            }
            FormatId::Pdf => Some("application/pdf"),
            FormatId::Doc => Some("application/msword"),
            FormatId::Json => Some("application/json"),
            FormatId::Image => Some("image/png"),
            FormatId::Print => None,
        }
    }

    /// Whether this format needs a snapshot surface to run.
    pub fn requires_surface(self) -> bool {
        matches!(self, FormatId::Image)
    }

    /// Whether the format is produced by reading records (as opposed to the
    /// live surface or the host print facility).
    pub fn is_record_driven(self) -> bool {
        matches!(
            self,
            FormatId::Xlsx | FormatId::Pdf | FormatId::Doc | FormatId::Json
        )
    }

    /// Derived artifact filename, `{base}.{ext}`.
    pub fn filename(self, base: &str) -> Option<String> {
        self.extension().map(|ext| format!("{base}.{ext}"))
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FormatId {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(FormatId::Xlsx),
            "pdf" => Ok(FormatId::Pdf),
            "doc" | "word" => Ok(FormatId::Doc),
            "json" => Ok(FormatId::Json),
            "image" | "png" => Ok(FormatId::Image),
            "print" => Ok(FormatId::Print),
            _ => Err(UnknownFormat {
                input: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown format: {input}. Use: xlsx, pdf, doc, json, image, print")]
pub struct UnknownFormat {
    pub input: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filenames_use_canonical_extensions() {
        assert_eq!(
            FormatId::Xlsx.filename("Fleet_Report").as_deref(),
            Some("Fleet_Report.xlsx")
        );
        assert_eq!(FormatId::Image.filename("x").as_deref(), Some("x.png"));
        assert_eq!(FormatId::Print.filename("x"), None);
    }

    #[test]
    fn test_parse_round_trips_ids() {
        for format in FormatId::ALL {
            assert_eq!(format.id().parse::<FormatId>().unwrap(), format);
        }
        assert_eq!("PNG".parse::<FormatId>().unwrap(), FormatId::Image);
        assert!("csv".parse::<FormatId>().is_err());
    }

    #[test]
    fn test_only_image_requires_surface() {
        let needing: Vec<FormatId> = FormatId::ALL
            .into_iter()
            .filter(|f| f.requires_surface())
            .collect();
        assert_eq!(needing, vec![FormatId::Image]);
    }
}
