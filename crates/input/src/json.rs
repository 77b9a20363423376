//! JSON uploads.
//!
//! Three shapes are tried in order:
//! 1. an array whose first element is an object,
//! 2. an object with exactly one array-valued property holding objects,
//! 3. anything else, kept whole as a single `Data` cell.
//!
//! The last step always succeeds, so this parser never fails.

use serde_json::{Map, Value};
use slide_core::{CellValue, ParsedTabularData};

/// Header used when the document has no recognizable record shape.
pub const FALLBACK_HEADER: &str = "Data";

pub fn parse_json(bytes: &[u8]) -> ParsedTabularData {
    let raw = String::from_utf8_lossy(bytes);

    let value = match serde_json::from_str::<Value>(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Upload is not valid JSON, keeping raw text: {}", e);
            return fallback(&raw);
        }
    };

    match records(&value) {
        Some(records) => from_records(records),
        None => {
            log::debug!("No record array found in JSON upload, keeping raw text");
            fallback(&raw)
        }
    }
}

/// Locate the record array, if the document has one.
fn records(value: &Value) -> Option<&[Value]> {
    match value {
        Value::Array(items) if matches!(items.first(), Some(Value::Object(_))) => Some(items.as_slice()),
        Value::Object(map) => {
            let mut arrays = map.values().filter_map(|v| v.as_array());
            let only = arrays.next()?;
            if arrays.next().is_some() {
                return None;
            }
            match only.first() {
                Some(Value::Object(_)) => Some(only.as_slice()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Headers come from the first record's keys; later records map onto them.
fn from_records(records: &[Value]) -> ParsedTabularData {
    let empty = Map::new();
    let headers: Vec<String> = records
        .first()
        .and_then(Value::as_object)
        .map(|first| first.keys().cloned().collect())
        .unwrap_or_default();

    let rows = records
        .iter()
        .map(|record| {
            let object = record.as_object().unwrap_or(&empty);
            headers
                .iter()
                .map(|h| object.get(h).map(cell).unwrap_or(CellValue::Missing))
                .collect()
        })
        .collect();

    ParsedTabularData::new(headers, rows)
}

fn cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Missing,
        Value::String(s) => CellValue::Text(s.clone()),
        Value::Number(n) => n
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or_else(|| CellValue::Text(n.to_string())),
        Value::Bool(b) => CellValue::Text(b.to_string()),
        nested => CellValue::Text(nested.to_string()),
    }
}

fn fallback(raw: &str) -> ParsedTabularData {
    ParsedTabularData::new(
        vec![FALLBACK_HEADER.to_string()],
        vec![vec![CellValue::Text(raw.to_string())]],
    )
}
