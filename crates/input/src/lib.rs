//! Tabular upload parsing.
//!
//! Every supported format is reduced to the same [`ParsedTabularData`]
//! shape: a header row followed by data rows.

pub mod delimited;
pub mod json;
pub mod xls;
pub mod xlsx;

use slide_core::{Error, ParsedTabularData, Result};
use std::path::Path;

/// Upload formats, detected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Xlsx,
    Xls,
    Json,
}

impl InputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Detect from a file name. Unknown or missing extensions are an error
    /// naming the extension.
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext).ok_or_else(|| {
            Error::UnsupportedFormat(if ext.is_empty() {
                "(none)".to_string()
            } else {
                ext.to_string()
            })
        })
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Xls => "xls",
            Self::Json => "json",
        }
    }
}

/// Parser dispatching uploads to the right format backend.
#[derive(Debug, Default)]
pub struct InputParser;

impl InputParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse uploaded bytes; the format comes from `filename`.
    pub fn parse(&self, filename: &str, bytes: &[u8]) -> Result<ParsedTabularData> {
        let format = InputFormat::from_filename(filename)?;
        log::debug!("Parsing '{}' as {}", filename, format.extension());

        let data = match format {
            InputFormat::Csv => delimited::parse_csv(bytes, filename)?,
            InputFormat::Xlsx => xlsx::parse_xlsx(bytes, filename)?,
            InputFormat::Xls => xls::parse_xls(bytes, filename)?,
            InputFormat::Json => json::parse_json(bytes),
        };

        log::debug!(
            "Parsed '{}': {} columns, {} rows",
            filename,
            data.headers.len(),
            data.row_count()
        );
        Ok(data)
    }

    /// Read and parse a file from disk.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedTabularData> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");
        // Reject unsupported names before touching the disk.
        InputFormat::from_filename(filename)?;
        let bytes = std::fs::read(path)?;
        self.parse(filename, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::CellValue;
    use std::io::Write;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_extension("CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_extension("xlsx"), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_extension("pdf"), None);
    }

    #[test]
    fn test_unsupported_extension_is_named() {
        let err = InputParser::new().parse("notes.txt", b"hello").unwrap_err();
        assert!(matches!(&err, Error::UnsupportedFormat(ext) if ext == "txt"));
        assert_eq!(err.to_string(), "Unsupported file format: txt");
    }

    #[test]
    fn test_missing_extension() {
        let err = InputParser::new().parse("README", b"x").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ext) if ext == "(none)"));
    }

    #[test]
    fn test_parse_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.CSV");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"A,B\n1,2\n").unwrap();

        let data = InputParser::new().parse_file(&path).unwrap();
        assert_eq!(data.headers, vec!["A", "B"]);
        assert_eq!(data.rows, vec![vec![CellValue::from("1"), CellValue::from("2")]]);
    }

    #[test]
    fn test_json_dispatch_never_fails() {
        let data = InputParser::new().parse("data.json", b"42").unwrap();
        assert_eq!(data.headers, vec!["Data"]);
    }
}
