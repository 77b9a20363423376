//! Error types for slide export and input parsing.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause carried by generation failures.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while parsing input or exporting a slide.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The uploaded file extension has no parser.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The uploaded file contained no rows at all (not even a header).
    #[error("File is empty: {0}")]
    EmptyFile(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error (for XLSX input).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for XLSX input).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// OLE/CFB container error (for XLS input).
    #[error("OLE/CFB error: {0}")]
    CfbError(String),

    /// A request was missing a required field or carried an invalid one.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The archetype identifier does not name a known layout.
    #[error("Unknown archetype: {0}")]
    UnknownArchetype(String),

    /// Serializing the presentation document failed.
    #[error("Export generation failed: {message}")]
    ExportGeneration {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// Capturing the snapshot or writing it to the clipboard failed.
    #[error("Clipboard export failed: {message}")]
    ClipboardExport {
        message: String,
        #[source]
        source: Option<Cause>,
    },
}

/// Coarse failure classes used when reporting errors to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller. Reported immediately, never an operator concern.
    Validation,
    /// The pipeline itself failed to produce output.
    Generation,
}

impl Error {
    /// Build an export generation error wrapping its cause.
    pub fn export_generation(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::ExportGeneration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a clipboard export error wrapping its cause.
    pub fn clipboard_export(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::ClipboardExport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_)
            | Error::EmptyFile(_)
            | Error::CorruptedFile(_)
            | Error::ZipError(_)
            | Error::XmlError(_)
            | Error::CfbError(_)
            | Error::InvalidRequest(_) => ErrorKind::Validation,
            Error::IoError(_)
            | Error::UnknownArchetype(_)
            | Error::ExportGeneration { .. }
            | Error::ClipboardExport { .. } => ErrorKind::Generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_export_generation_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = Error::export_generation("writing slide1.xml", cause);

        assert_eq!(err.to_string(), "Export generation failed: writing slide1.xml");
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".to_string()));
        assert_eq!(err.kind(), ErrorKind::Generation);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::EmptyFile("a.csv".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::UnsupportedFormat("txt".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::UnknownArchetype("pie".into()).kind(), ErrorKind::Generation);
    }

    #[test]
    fn test_unsupported_format_names_extension() {
        let err = Error::UnsupportedFormat("docx".into());
        assert!(err.to_string().contains("docx"));
    }
}
