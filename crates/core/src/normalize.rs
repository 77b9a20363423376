//! Text normalization for slide content.
//!
//! Free text arrives from a language model or a user form, so it carries
//! stray whitespace, mixed line endings and decomposed Unicode. Everything
//! that lands in a text box goes through here first.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of horizontal whitespace into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

/// Regex to collapse three or more consecutive newlines into a paragraph break.
static BLANK_LINES_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Characters that never belong in a text run (zero-width and BOM).
const INVISIBLE_CHARS: &[char] = &['\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}'];

/// Text normalizer for slide content fields.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Whether to keep line breaks inside a field.
    preserve_line_breaks: bool,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Create a normalizer that keeps line breaks.
    pub fn new() -> Self {
        Self {
            preserve_line_breaks: true,
        }
    }

    /// Set whether to preserve line breaks.
    pub fn with_preserve_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Normalize a single text field.
    ///
    /// - Composes Unicode to NFC
    /// - Converts CRLF and CR to LF
    /// - Drops zero-width characters
    /// - Collapses whitespace runs and trims each line
    pub fn normalize(&self, text: &str) -> String {
        let composed: String = text
            .nfc()
            .filter(|c| !INVISIBLE_CHARS.contains(c))
            .collect();
        let unified = composed.replace("\r\n", "\n").replace('\r', "\n");

        if self.preserve_line_breaks {
            let lines = unified
                .lines()
                .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            BLANK_LINES_REGEX
                .replace_all(lines.trim_matches('\n'), "\n\n")
                .to_string()
        } else {
            let flat = unified.replace('\n', " ");
            WHITESPACE_COLLAPSE_REGEX
                .replace_all(&flat, " ")
                .trim()
                .to_string()
        }
    }

    /// Normalize an optional field, mapping blank results to `None`.
    pub fn normalize_optional(&self, text: Option<&str>) -> Option<String> {
        text.map(|t| self.normalize(t)).filter(|t| !t.is_empty())
    }

    /// Normalize a list of entries, dropping the ones that end up blank.
    pub fn normalize_list(&self, items: &[String]) -> Vec<String> {
        items
            .iter()
            .map(|item| self.normalize(item))
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Split text into paragraphs on blank lines.
    pub fn paragraphs(&self, text: &str) -> Vec<String> {
        self.normalize(text)
            .split("\n\n")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }
}
