//! XLSX (Office Open XML spreadsheet) uploads.
//!
//! Only the first worksheet is read. Cell references are resolved to
//! column indices so sparse rows keep their positions.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slide_core::{CellValue, Error, ParsedTabularData, Result};
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

const FALLBACK_SHEET: &str = "xl/worksheets/sheet1.xml";

/// Last addressable column (`XFD`).
const MAX_COLUMN: usize = 16_383;

pub fn parse_xlsx(bytes: &[u8], filename: &str) -> Result<ParsedTabularData> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

    let shared = match read_part(&mut archive, "xl/sharedStrings.xml") {
        Ok(xml) => shared_strings(&xml)?,
        Err(_) => Vec::new(),
    };

    let sheet_path = first_sheet_path(&mut archive).unwrap_or_else(|| FALLBACK_SHEET.to_string());
    log::debug!("Reading worksheet '{}' from '{}'", sheet_path, filename);
    let sheet = read_part(&mut archive, &sheet_path)?;

    let mut rows = sheet_rows(&sheet, &shared)?.into_iter();
    let headers = rows
        .next()
        .ok_or_else(|| Error::EmptyFile(filename.to_string()))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    Ok(ParsedTabularData::new(headers, rows.collect()))
}

/// Resolve the first `<sheet>` of the workbook to its part path.
fn first_sheet_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let workbook = read_part(archive, "xl/workbook.xml").ok()?;
    let rel_id = {
        let mut reader = Reader::from_str(&workbook);
        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sheet" => {
                    break attribute(e, b"r:id")?;
                }
                Ok(Event::Eof) | Err(_) => return None,
                _ => {}
            }
        }
    };

    let rels = read_part(archive, "xl/_rels/workbook.xml.rels").ok()?;
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                if attribute(e, b"Id").as_deref() == Some(rel_id.as_str()) {
                    let target = attribute(e, b"Target")?;
                    return Some(match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{}", target),
                    });
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

/// Shared string table, one entry per `<si>` with rich-text runs joined.
fn shared_strings(xml: &str) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut reader = Reader::from_str(xml);
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => current = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if local_name(e.name().as_ref()) == b"si" => strings.push(String::new()),
            Ok(Event::Text(ref e)) if in_text => {
                if let Some(s) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad shared string: {}", e)))?;
                    s.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"si" => strings.extend(current.take()),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing shared strings: {}", e))),
            _ => {}
        }
    }

    Ok(strings)
}

/// The cell being read.
#[derive(Default)]
struct PendingCell {
    column: usize,
    kind: String,
    value: String,
}

fn sheet_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<CellValue>>> {
    let mut rows = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut row: Option<Vec<CellValue>> = None;
    let mut cell: Option<PendingCell> = None;
    let mut in_value = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"row" => row = Some(Vec::new()),
                b"c" => cell = Some(pending_cell(e, row.as_ref())),
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    let pending = pending_cell(e, row.as_ref());
                    place(&mut row, pending.column, CellValue::Missing);
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_value => {
                if let Some(c) = cell.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad cell text: {}", e)))?;
                    c.value.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(c) = cell.take() {
                        let value = convert(&c, shared);
                        place(&mut row, c.column, value);
                    }
                }
                b"row" => rows.extend(row.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::XmlError(format!("Error parsing worksheet: {}", e))),
            _ => {}
        }
    }

    Ok(rows)
}

fn pending_cell(e: &BytesStart<'_>, row: Option<&Vec<CellValue>>) -> PendingCell {
    let next = row.map(Vec::len).unwrap_or(0);
    PendingCell {
        column: attribute(e, b"r")
            .and_then(|r| column_index(&r))
            .unwrap_or(next),
        kind: attribute(e, b"t").unwrap_or_default(),
        value: String::new(),
    }
}

/// Put a value at its column, filling any gap with missing cells.
fn place(row: &mut Option<Vec<CellValue>>, column: usize, value: CellValue) {
    if let Some(row) = row.as_mut() {
        if row.len() <= column {
            row.resize(column + 1, CellValue::Missing);
        }
        row[column] = value;
    }
}

fn convert(cell: &PendingCell, shared: &[String]) -> CellValue {
    let raw = cell.value.as_str();
    match cell.kind.as_str() {
        "s" => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared.get(i))
            .map(|s| CellValue::Text(s.clone()))
            .unwrap_or_else(|| {
                log::warn!("Shared string index '{}' out of range", raw);
                CellValue::Missing
            }),
        "b" => CellValue::Text(if raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        "str" | "inlineStr" | "e" => CellValue::Text(raw.to_string()),
        _ if raw.is_empty() => CellValue::Missing,
        _ => raw
            .trim()
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or_else(|_| CellValue::Text(raw.to_string())),
    }
}

/// Zero-based column of a reference like `B7` or `AA12`.
///
/// References past `XFD` are treated as absent.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters.iter().try_fold(0usize, |acc, &b| {
        acc.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)
    })?;
    Some(number - 1).filter(|&column| column <= MAX_COLUMN)
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;
    Ok(content)
}
