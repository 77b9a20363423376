//! Comma-separated uploads.

use slide_core::{CellValue, Error, ParsedTabularData, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parse CSV bytes. The first record is the header row.
///
/// Records may have different lengths. Fields are kept as text.
pub fn parse_csv(bytes: &[u8], filename: &str) -> Result<ParsedTabularData> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for record in reader.byte_records() {
        let record =
            record.map_err(|e| Error::CorruptedFile(format!("Malformed CSV in '{}': {}", filename, e)))?;
        records.push(
            record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect::<Vec<_>>(),
        );
    }

    let mut records = records.into_iter();
    let headers = records
        .next()
        .ok_or_else(|| Error::EmptyFile(filename.to_string()))?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let rows = records
        .map(|record| record.into_iter().map(CellValue::Text).collect())
        .collect();

    Ok(ParsedTabularData::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_and_one_row() {
        let data = parse_csv(b"A,B\n1,2\n", "t.csv").unwrap();

        assert_eq!(data.headers, vec!["A", "B"]);
        assert_eq!(data.rows, vec![vec![CellValue::from("1"), CellValue::from("2")]]);
    }

    #[test]
    fn test_header_only_has_no_rows() {
        let data = parse_csv(b"A,B\n", "t.csv").unwrap();

        assert_eq!(data.headers, vec!["A", "B"]);
        assert!(data.rows.is_empty());
    }

    #[test]
    fn test_zero_records_is_empty_file() {
        assert!(matches!(parse_csv(b"", "empty.csv"), Err(Error::EmptyFile(name)) if name == "empty.csv"));
    }

    #[test]
    fn test_bom_quotes_and_ragged_rows() {
        let data = parse_csv(b"\xEF\xBB\xBFname,note\n\"Lee, J\",\"said \"\"hi\"\"\"\nsolo\n", "t.csv").unwrap();

        assert_eq!(data.headers, vec!["name", "note"]);
        assert_eq!(data.rows[0], vec![CellValue::from("Lee, J"), CellValue::from("said \"hi\"")]);
        assert_eq!(data.rows[1], vec![CellValue::from("solo")]);
    }

    #[test]
    fn test_blank_rows_are_dropped() {
        let data = parse_csv(b"A,B\n , \n3,4\n", "t.csv").unwrap();
        assert_eq!(data.row_count(), 1);
    }
}
