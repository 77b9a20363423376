//! Legacy XLS (BIFF8 inside an OLE/CFB container) uploads.
//!
//! Reads the workbook globals for the shared string table and the position
//! of the first worksheet, then walks that worksheet's cell records.
//! Formatting and merged regions are ignored; formula cells
//! contribute their cached result.

use cfb::CompoundFile;
use slide_core::{CellValue, Error, ParsedTabularData, Result};
use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};

/// Record type constants for BIFF8.
mod record_types {
    pub const BOF: u16 = 0x0809;
    pub const EOF: u16 = 0x000A;
    pub const BOUNDSHEET: u16 = 0x0085;
    pub const SST: u16 = 0x00FC;
    pub const CONTINUE: u16 = 0x003C;
    pub const LABELSST: u16 = 0x00FD;
    pub const LABEL: u16 = 0x0204;
    pub const NUMBER: u16 = 0x0203;
    pub const RK: u16 = 0x027E;
    pub const MULRK: u16 = 0x00BD;
    pub const FORMULA: u16 = 0x0006;
    pub const STRING: u16 = 0x0207;
    pub const BOOLERR: u16 = 0x0205;
}

const BIFF8_VERSION: u16 = 0x0600;

pub fn parse_xls(bytes: &[u8], filename: &str) -> Result<ParsedTabularData> {
    let mut cfb = CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| Error::CorruptedFile(format!("'{}' is not an OLE container: {}", filename, e)))?;
    let stream = read_workbook_stream(&mut cfb)?;

    let records = records(&stream);
    let globals = read_globals(&records)?;
    let sheet_offset = globals
        .first_sheet
        .ok_or_else(|| Error::CorruptedFile(format!("'{}' has no worksheet", filename)))?;
    log::debug!(
        "XLS '{}': {} shared strings, first sheet at offset {}",
        filename,
        globals.strings.len(),
        sheet_offset
    );

    let sheet_records = records.iter().skip_while(|r| r.offset != sheet_offset);
    let mut rows = read_cells(sheet_records, &globals.strings).into_values();

    let headers = rows
        .next()
        .ok_or_else(|| Error::EmptyFile(filename.to_string()))?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    Ok(ParsedTabularData::new(headers, rows.collect()))
}

fn read_workbook_stream<R: Read + Seek>(cfb: &mut CompoundFile<R>) -> Result<Vec<u8>> {
    let path = ["/Workbook", "/Book"]
        .into_iter()
        .find(|p| cfb.is_stream(p))
        .ok_or_else(|| Error::CorruptedFile("Missing 'Workbook' stream".to_string()))?;

    let mut stream = cfb
        .open_stream(path)
        .map_err(|e| Error::CfbError(format!("Failed to open workbook stream: {}", e)))?;
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|e| Error::CfbError(format!("Failed to read stream: {}", e)))?;
    Ok(data)
}

/// One BIFF record and its position in the stream.
struct Record<'a> {
    offset: u32,
    kind: u16,
    body: &'a [u8],
}

fn records(data: &[u8]) -> Vec<Record<'_>> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 4 <= data.len() {
        let kind = read_u16_le(data, pos);
        let len = read_u16_le(data, pos + 2) as usize;
        let start = pos + 4;
        if start + len > data.len() {
            log::warn!("Truncated BIFF record 0x{:04X} at offset {}", kind, pos);
            break;
        }
        out.push(Record {
            offset: pos as u32,
            kind,
            body: &data[start..start + len],
        });
        pos = start + len;
    }
    out
}

#[derive(Debug, Default)]
struct Globals {
    strings: Vec<String>,
    first_sheet: Option<u32>,
}

fn read_globals(records: &[Record<'_>]) -> Result<Globals> {
    let mut globals = Globals::default();

    match records.first() {
        Some(r) if r.kind == record_types::BOF && r.body.len() >= 2 => {
            let version = read_u16_le(r.body, 0);
            if version != BIFF8_VERSION {
                return Err(Error::CorruptedFile(format!(
                    "Unsupported BIFF version 0x{:04X}",
                    version
                )));
            }
        }
        _ => return Err(Error::CorruptedFile("Workbook stream does not start with BOF".to_string())),
    }

    let mut i = 1;
    while i < records.len() && records[i].kind != record_types::EOF {
        let record = &records[i];
        match record.kind {
            record_types::BOUNDSHEET if record.body.len() >= 6 => {
                // Sheet type 0 is a worksheet; charts and macros are skipped.
                if globals.first_sheet.is_none() && record.body[5] == 0 {
                    globals.first_sheet = Some(read_u32_le(record.body, 0));
                }
            }
            record_types::SST => {
                let mut segments = vec![record.body];
                while let Some(next) = records.get(i + 1).filter(|r| r.kind == record_types::CONTINUE) {
                    segments.push(next.body);
                    i += 1;
                }
                globals.strings = read_sst(segments);
            }
            _ => {}
        }
        i += 1;
    }

    Ok(globals)
}

/// Byte cursor over a record and its CONTINUE records.
struct Segments<'a> {
    parts: Vec<&'a [u8]>,
    part: usize,
    pos: usize,
}

impl<'a> Segments<'a> {
    fn new(parts: Vec<&'a [u8]>) -> Self {
        Self { parts, part: 0, pos: 0 }
    }

    fn at_boundary(&self) -> bool {
        self.pos >= self.parts.get(self.part).map_or(0, |p| p.len()) && self.part + 1 < self.parts.len()
    }

    fn byte(&mut self) -> Option<u8> {
        while self.at_boundary() {
            self.part += 1;
            self.pos = 0;
        }
        let b = *self.parts.get(self.part)?.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn u16(&mut self) -> Option<u16> {
        Some(u16::from_le_bytes([self.byte()?, self.byte()?]))
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes([self.byte()?, self.byte()?, self.byte()?, self.byte()?]))
    }

    fn skip(&mut self, n: usize) -> Option<()> {
        for _ in 0..n {
            self.byte()?;
        }
        Some(())
    }

    /// Character data may continue in the next record, which then starts
    /// with a fresh option byte choosing the character width.
    fn chars(&mut self, count: usize, mut wide: bool) -> Option<String> {
        let mut units = Vec::with_capacity(count);
        for _ in 0..count {
            if self.at_boundary() {
                self.part += 1;
                self.pos = 0;
                wide = self.byte()? & 0x01 != 0;
            }
            units.push(if wide { self.u16()? } else { self.byte()? as u16 });
        }
        Some(String::from_utf16_lossy(&units))
    }

    /// XLUnicodeRichExtendedString.
    fn rich_string(&mut self) -> Option<String> {
        let count = self.u16()? as usize;
        let flags = self.byte()?;
        let runs = if flags & 0x08 != 0 { self.u16()? as usize } else { 0 };
        let ext = if flags & 0x04 != 0 { self.u32()? as usize } else { 0 };
        let text = self.chars(count, flags & 0x01 != 0)?;
        self.skip(runs * 4 + ext)?;
        Some(text)
    }
}

fn read_sst(parts: Vec<&[u8]>) -> Vec<String> {
    let mut cursor = Segments::new(parts);
    let (Some(_total), Some(unique)) = (cursor.u32(), cursor.u32()) else {
        return Vec::new();
    };

    let mut strings = Vec::with_capacity(unique as usize);
    for _ in 0..unique {
        match cursor.rich_string() {
            Some(s) => strings.push(s),
            None => {
                log::warn!("Shared string table ended after {} of {} strings", strings.len(), unique);
                break;
            }
        }
    }
    strings
}

/// Short unicode string (LABEL and STRING records).
fn short_string(body: &[u8]) -> Option<String> {
    Segments::new(vec![body]).rich_string()
}

/// Cells of one worksheet, keyed by row index.
fn read_cells<'a>(
    records: impl Iterator<Item = &'a Record<'a>>,
    strings: &[String],
) -> BTreeMap<u16, Vec<CellValue>> {
    let mut rows: BTreeMap<u16, Vec<CellValue>> = BTreeMap::new();
    let mut pending_formula: Option<(u16, u16)> = None;

    for record in records.skip(1) {
        let body = record.body;
        match record.kind {
            record_types::EOF => break,
            // STRING has no cell position; it belongs to the preceding formula.
            record_types::STRING => {
                if let (Some((r, c)), Some(text)) = (pending_formula.take(), short_string(body)) {
                    place(&mut rows, r, c, CellValue::Text(text));
                }
                continue;
            }
            _ if body.len() < 6 => continue,
            _ => {}
        }
        let row = read_u16_le(body, 0);
        let col = read_u16_le(body, 2);

        match record.kind {
            record_types::LABELSST if body.len() >= 10 => {
                let index = read_u32_le(body, 6) as usize;
                match strings.get(index) {
                    Some(s) => place(&mut rows, row, col, CellValue::Text(s.clone())),
                    None => log::warn!("Shared string index {} out of range", index),
                }
            }
            record_types::LABEL => {
                if let Some(text) = short_string(&body[6..]) {
                    place(&mut rows, row, col, CellValue::Text(text));
                }
            }
            record_types::NUMBER if body.len() >= 14 => {
                place(&mut rows, row, col, CellValue::Number(read_f64_le(body, 6)));
            }
            record_types::RK if body.len() >= 10 => {
                place(&mut rows, row, col, CellValue::Number(decode_rk(read_u32_le(body, 6))));
            }
            record_types::MULRK => {
                // ixfe + rk pairs, then the last column index.
                let pairs = (body.len() - 6) / 6;
                let last = read_u16_le(body, body.len() - 2);
                for k in 0..pairs {
                    let Some(c) = col.checked_add(k as u16).filter(|&c| c <= last) else {
                        break;
                    };
                    let rk = read_u32_le(body, 4 + k * 6 + 2);
                    place(&mut rows, row, c, CellValue::Number(decode_rk(rk)));
                }
            }
            record_types::FORMULA if body.len() >= 14 => {
                let result = &body[6..14];
                if result[6] == 0xFF && result[7] == 0xFF {
                    match result[0] {
                        0 => pending_formula = Some((row, col)),
                        1 => place(&mut rows, row, col, boolean(result[2])),
                        2 => place(&mut rows, row, col, CellValue::Text(error_text(result[2]))),
                        _ => {}
                    }
                } else {
                    place(&mut rows, row, col, CellValue::Number(read_f64_le(body, 6)));
                }
            }
            record_types::BOOLERR if body.len() >= 8 => {
                let value = if body[7] == 0 {
                    boolean(body[6])
                } else {
                    CellValue::Text(error_text(body[6]))
                };
                place(&mut rows, row, col, value);
            }
            _ => {}
        }
    }

    rows
}

fn place(rows: &mut BTreeMap<u16, Vec<CellValue>>, row: u16, col: u16, value: CellValue) {
    let cells = rows.entry(row).or_default();
    let col = col as usize;
    if cells.len() <= col {
        cells.resize(col + 1, CellValue::Missing);
    }
    cells[col] = value;
}

fn boolean(b: u8) -> CellValue {
    CellValue::Text(if b != 0 { "TRUE" } else { "FALSE" }.to_string())
}

fn error_text(code: u8) -> String {
    match code {
        0x00 => "#NULL!",
        0x07 => "#DIV/0!",
        0x0F => "#VALUE!",
        0x17 => "#REF!",
        0x1D => "#NAME?",
        0x24 => "#NUM!",
        _ => "#N/A",
    }
    .to_string()
}

/// RK numbers pack either a 30-bit integer or the top bits of a double,
/// optionally scaled by 100.
fn decode_rk(rk: u32) -> f64 {
    let value = if rk & 0x02 != 0 {
        ((rk as i32) >> 2) as f64
    } else {
        f64::from_bits(((rk & 0xFFFF_FFFC) as u64) << 32)
    };
    if rk & 0x01 != 0 {
        value / 100.0
    } else {
        value
    }
}

/// Read a little-endian u16 from a byte slice.
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Read a little-endian u32 from a byte slice.
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn read_f64_le(data: &[u8], offset: usize) -> f64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    f64::from_le_bytes(bytes)
}
