//! Plain-text rendering of tabular uploads for the classification step.
//!
//! Produces one tab-separated line per row, header first, capped at a
//! fixed number of data rows. Excess rows are summarized, never dropped
//! silently.

use crate::types::ParsedTabularData;

/// Default cap on data rows passed downstream.
pub const DEFAULT_MAX_ROWS: usize = 50;

/// Formatter for tabular data handed to the classification step.
#[derive(Debug, Clone)]
pub struct DownstreamFormatter {
    /// Maximum number of data rows emitted.
    max_rows: usize,
}

impl Default for DownstreamFormatter {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl DownstreamFormatter {
    /// Create a formatter with the default 50-row cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter with a custom row cap.
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = rows;
        self
    }

    /// Format parsed data as tab-separated lines.
    ///
    /// # Example output
    /// ```text
    /// Region	Revenue
    /// EMEA	120
    /// APAC	95
    /// ... and 3 more rows
    /// ```
    pub fn format(&self, data: &ParsedTabularData) -> String {
        let mut lines = Vec::with_capacity(data.rows.len().min(self.max_rows) + 2);
        lines.push(
            data.headers
                .iter()
                .map(|h| single_line(h))
                .collect::<Vec<_>>()
                .join("\t"),
        );

        for row in data.rows.iter().take(self.max_rows) {
            lines.push(
                row.iter()
                    .map(|cell| single_line(&cell.to_string()))
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }

        let omitted = data.rows.len().saturating_sub(self.max_rows);
        if omitted > 0 {
            lines.push(summary_line(omitted));
        }

        lines.join("\n")
    }
}

/// Tabs and line breaks inside a cell become spaces so each row stays one line.
fn single_line(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ")
}

/// Summary line for rows left out of the output.
fn summary_line(omitted: usize) -> String {
    if omitted == 1 {
        "... and 1 more row".to_string()
    } else {
        format!("... and {} more rows", omitted)
    }
}

/// Format with the default cap.
pub fn format_for_downstream_use(data: &ParsedTabularData) -> String {
    DownstreamFormatter::new().format(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn table(rows: usize) -> ParsedTabularData {
        ParsedTabularData::new(
            vec!["A".into(), "B".into()],
            (0..rows)
                .map(|i| vec![CellValue::Number(i as f64), CellValue::from("x")])
                .collect(),
        )
    }

    #[test]
    fn test_format_small_table() {
        let out = format_for_downstream_use(&table(2));
        assert_eq!(out, "A\tB\n0\tx\n1\tx");
    }

    #[test]
    fn test_format_exactly_at_cap_has_no_summary() {
        let out = format_for_downstream_use(&table(50));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 51);
        assert!(!out.contains("more row"));
    }

    #[test]
    fn test_format_one_over_cap() {
        let out = format_for_downstream_use(&table(51));
        let lines: Vec<&str> = out.lines().collect();

        // header + 50 data rows + summary
        assert_eq!(lines.len(), 52);
        assert_eq!(lines[50], "49\tx");
        assert_eq!(lines[51], "... and 1 more row");
    }

    #[test]
    fn test_format_many_over_cap() {
        let out = DownstreamFormatter::new().with_max_rows(3).format(&table(10));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "... and 7 more rows");
    }

    #[test]
    fn test_format_ragged_and_missing_cells() {
        let data = ParsedTabularData::new(
            vec!["name".into(), "team".into(), "age".into()],
            vec![vec!["Ana".into(), CellValue::Missing, CellValue::Number(31.0)], vec!["Bo".into()]],
        );
        assert_eq!(format_for_downstream_use(&data), "name\tteam\tage\nAna\t\t31\nBo");
    }

    #[test]
    fn test_embedded_tabs_and_newlines_keep_one_line_per_row() {
        let rows = (0..51)
            .map(|i| vec![CellValue::from(format!("line {}\nmore\tcells", i)), CellValue::Number(i as f64)])
            .collect();
        let data = ParsedTabularData::new(vec!["note\r\n".into(), "n".into()], rows);
        let out = format_for_downstream_use(&data);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 52);
        assert_eq!(lines[0], "note  \tn");
        assert_eq!(lines[1], "line 0 more cells\t0");
        assert_eq!(lines[51], "... and 1 more row");
    }

    #[test]
    fn test_format_header_only() {
        let data = ParsedTabularData::new(vec!["only".into()], vec![]);
        assert_eq!(format_for_downstream_use(&data), "only");
    }
}
