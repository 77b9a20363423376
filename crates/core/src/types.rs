//! Domain types for slide content, tabular input, and export artifacts.

use crate::normalize::TextNormalizer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label rendered in the title region when a slide has no usable title.
pub const DEFAULT_TITLE: &str = "Untitled Slide";

/// MIME type of an exported presentation document.
pub const PPTX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Archetype-specific property bag supplied to rendering.
///
/// This is the superset across all archetypes; each archetype reads only
/// the fields it lays out and ignores the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateProps {
    #[serde(default)]
    pub title: Option<String>,

    /// Key message shown under the title.
    #[serde(default, alias = "keyMessage")]
    pub subtitle: Option<String>,

    /// Compactness mode (`compact` or `presentation`).
    #[serde(default)]
    pub density: Option<String>,

    #[serde(default)]
    pub metrics: Vec<Metric>,

    #[serde(default)]
    pub footnote: Option<String>,

    /// Narrative body text; blank lines separate paragraphs.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub bullets: Vec<String>,

    #[serde(default)]
    pub left: Option<ComparisonColumn>,

    #[serde(default)]
    pub right: Option<ComparisonColumn>,

    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl TemplateProps {
    /// Create props carrying only a title.
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }
}

/// A single headline number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

impl Metric {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One side of a comparison slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonColumn {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub points: Vec<String>,
}

/// A dated step on a timeline slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub label: String,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Typed, normalized content of a slide, independent of archetype.
///
/// `title` is never empty. Every optional field is `None` (or an empty
/// list) when the source was absent or blank, and the matching visual
/// element is then not drawn at all.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredSlideContent {
    pub title: String,
    pub subtitle: Option<String>,
    pub metrics: Vec<Metric>,
    pub footnote: Option<String>,
    pub paragraphs: Vec<String>,
    pub bullets: Vec<String>,
    pub left: Option<ComparisonColumn>,
    pub right: Option<ComparisonColumn>,
    pub milestones: Vec<Milestone>,
}

impl StructuredSlideContent {
    /// Build normalized content from raw template props.
    pub fn from_props(props: &TemplateProps) -> Self {
        Self::from_props_with(props, &TextNormalizer::new())
    }

    /// Build normalized content using a specific normalizer.
    pub fn from_props_with(props: &TemplateProps, normalizer: &TextNormalizer) -> Self {
        let title = normalizer
            .normalize_optional(props.title.as_deref())
            .unwrap_or_else(|| {
                log::debug!("No title supplied, using default label");
                DEFAULT_TITLE.to_string()
            });

        let metrics = props
            .metrics
            .iter()
            .filter_map(|m| {
                let label = normalizer.normalize(&m.label);
                let value = normalizer.normalize(&m.value);
                if label.is_empty() && value.is_empty() {
                    None
                } else {
                    Some(Metric { label, value })
                }
            })
            .collect();

        let milestones = props
            .milestones
            .iter()
            .filter_map(|m| {
                let label = normalizer.normalize(&m.label);
                if label.is_empty() {
                    return None;
                }
                Some(Milestone {
                    label,
                    detail: normalizer.normalize_optional(m.detail.as_deref()),
                })
            })
            .collect();

        Self {
            title,
            subtitle: normalizer.normalize_optional(props.subtitle.as_deref()),
            metrics,
            footnote: normalizer.normalize_optional(props.footnote.as_deref()),
            paragraphs: props
                .body
                .as_deref()
                .map(|b| normalizer.paragraphs(b))
                .unwrap_or_default(),
            bullets: normalizer.normalize_list(&props.bullets),
            left: normalize_column(props.left.as_ref(), normalizer),
            right: normalize_column(props.right.as_ref(), normalizer),
            milestones,
        }
    }
}

fn normalize_column(
    column: Option<&ComparisonColumn>,
    normalizer: &TextNormalizer,
) -> Option<ComparisonColumn> {
    let column = column?;
    let heading = normalizer.normalize_optional(column.heading.as_deref());
    let points = normalizer.normalize_list(&column.points);
    if heading.is_none() && points.is_empty() {
        None
    } else {
        Some(ComparisonColumn { heading, points })
    }
}

/// A single cell of uploaded tabular data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Key absent from a JSON record, or an empty spreadsheet cell.
    Missing,
}

impl CellValue {
    /// Whether the cell carries no visible content.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
            CellValue::Missing => true,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Missing => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// Uploaded tabular data reduced to a header row and data rows.
///
/// Rows are not padded to the header width; consumers must tolerate
/// ragged access. Rows in which every cell is blank never appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTabularData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ParsedTabularData {
    /// Build from headers and rows, dropping rows that are entirely blank.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let total = rows.len();
        let rows: Vec<_> = rows
            .into_iter()
            .filter(|row| !row.iter().all(CellValue::is_blank))
            .collect();
        if rows.len() < total {
            log::debug!("Dropped {} blank rows", total - rows.len());
        }
        Self { headers, rows }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A finished download: document bytes tagged with filename and MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
}

impl ExportArtifact {
    /// Create a presentation artifact.
    pub fn presentation(bytes: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            mime_type: PPTX_MIME_TYPE.to_string(),
        }
    }

    /// `Content-Disposition` header value naming the file.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_title_uses_default() {
        let content = StructuredSlideContent::from_props(&TemplateProps::default());
        assert_eq!(content.title, DEFAULT_TITLE);

        let blank = TemplateProps::with_title("   ");
        assert_eq!(StructuredSlideContent::from_props(&blank).title, DEFAULT_TITLE);
    }

    #[test]
    fn test_optional_fields_suppressed_when_blank() {
        let props = TemplateProps {
            title: Some("Q3 Review".into()),
            subtitle: Some("  ".into()),
            footnote: Some("".into()),
            ..Default::default()
        };
        let content = StructuredSlideContent::from_props(&props);

        assert_eq!(content.title, "Q3 Review");
        assert_eq!(content.subtitle, None);
        assert_eq!(content.footnote, None);
        assert!(content.metrics.is_empty());
    }

    #[test]
    fn test_metrics_keep_order_and_drop_empty() {
        let props = TemplateProps {
            metrics: vec![
                Metric::new("ARR", "$12M"),
                Metric::new(" ", ""),
                Metric::new("NRR", "118%"),
            ],
            ..Default::default()
        };
        let content = StructuredSlideContent::from_props(&props);

        assert_eq!(
            content.metrics,
            vec![Metric::new("ARR", "$12M"), Metric::new("NRR", "118%")]
        );
    }

    #[test]
    fn test_props_from_camel_case_json() {
        let props: TemplateProps = serde_json::from_str(
            r#"{"title":"Growth","keyMessage":"Up and to the right","density":"compact",
                "metrics":[{"label":"Users","value":"1.2M"}],"unknownField":true}"#,
        )
        .unwrap();

        assert_eq!(props.subtitle.as_deref(), Some("Up and to the right"));
        assert_eq!(props.density.as_deref(), Some("compact"));
        assert_eq!(props.metrics.len(), 1);
    }

    #[test]
    fn test_empty_comparison_column_is_none() {
        let props = TemplateProps {
            left: Some(ComparisonColumn {
                heading: Some(" ".into()),
                points: vec!["".into()],
            }),
            right: Some(ComparisonColumn {
                heading: Some("After".into()),
                points: vec![],
            }),
            ..Default::default()
        };
        let content = StructuredSlideContent::from_props(&props);

        assert!(content.left.is_none());
        assert_eq!(content.right.unwrap().heading.as_deref(), Some("After"));
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Number(3.0).to_string(), "3");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::from("x").to_string(), "x");
        assert_eq!(CellValue::Missing.to_string(), "");
    }

    #[test]
    fn test_blank_rows_dropped() {
        let parsed = ParsedTabularData::new(
            vec!["A".into(), "B".into()],
            vec![
                vec!["1".into(), "2".into()],
                vec![" ".into(), CellValue::Missing],
                vec![CellValue::Number(0.0)],
            ],
        );

        assert_eq!(parsed.row_count(), 2);
        assert_eq!(parsed.rows[1], vec![CellValue::Number(0.0)]);
    }

    #[test]
    fn test_artifact_headers() {
        let artifact = ExportArtifact::presentation(vec![1, 2, 3], "slidecraft-abcd1234.pptx");

        assert_eq!(artifact.mime_type, PPTX_MIME_TYPE);
        assert_eq!(
            artifact.content_disposition(),
            "attachment; filename=\"slidecraft-abcd1234.pptx\""
        );
    }
}
