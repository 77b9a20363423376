//! WASM-compatible export service for archetype slides.
//!
//! This crate exposes slide export and upload parsing to JavaScript
//! for use in Cloudflare Workers.

pub mod error;
pub mod service;
pub mod store;

pub use error::ServiceError;
pub use service::{CallerIdentity, ExportService, GenerateRequest, ServiceResponse};
pub use store::{InMemoryQuotaGate, InMemorySlideStore, QuotaGate, SlideRecord, SlideStore};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slide_core::{DownstreamFormatter, ParsedTabularData, TemplateProps};
use slide_input::InputParser;
use slide_pptx::{ExportConfig, SlideExporter};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Export service holding its slide records and quota counts in memory.
#[wasm_bindgen]
pub struct SlideWorker {
    service: ExportService<InMemorySlideStore, InMemoryQuotaGate>,
}

#[wasm_bindgen]
impl SlideWorker {
    /// # Arguments
    /// * `daily_limit` - Exports allowed per account per UTC day
    /// * `config` - Optional `{productName, author, company}` object
    #[wasm_bindgen(constructor)]
    pub fn new(daily_limit: u32, config: JsValue) -> Result<SlideWorker, JsValue> {
        let config: ExportConfig = if config.is_undefined() || config.is_null() {
            ExportConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };
        Ok(Self::with_config(daily_limit, config))
    }

    /// Save a slide for `owner_id` so it can be exported by id later.
    pub fn save_slide(
        &self,
        slide_id: &str,
        owner_id: &str,
        archetype_id: &str,
        template_props: JsValue,
    ) -> Result<(), JsValue> {
        let template_props: TemplateProps = serde_wasm_bindgen::from_value(template_props)
            .map_err(|e| JsValue::from_str(&format!("Invalid template props: {}", e)))?;
        self.service.store().insert(SlideRecord {
            slide_id: slide_id.to_string(),
            owner_id: owner_id.to_string(),
            archetype_id: archetype_id.to_string(),
            template_props,
        });
        Ok(())
    }

    /// Export slide content sent in the request body.
    ///
    /// # Returns
    /// `{status, contentType, contentDisposition, body}` where `body` is a
    /// `Uint8Array`. Throws only when the request is not an object or `day`
    /// is not `YYYY-MM-DD`.
    pub fn generate(&self, request: JsValue, account_id: Option<String>, day: Option<String>) -> Result<JsValue, JsValue> {
        let request: GenerateRequest = serde_wasm_bindgen::from_value(request)
            .map_err(|e| JsValue::from_str(&format!("Invalid request: {}", e)))?;
        let day = resolve_day(day.as_deref()).map_err(|e| JsValue::from_str(&e))?;
        let caller = account_id.map(CallerIdentity::new);
        let result = self.service.generate(caller.as_ref(), request, day);
        to_js_response(ServiceResponse::from_result(result))
    }

    /// Export a saved slide owned by the caller.
    pub fn lookup(&self, slide_id: &str, account_id: Option<String>, day: Option<String>) -> Result<JsValue, JsValue> {
        let day = resolve_day(day.as_deref()).map_err(|e| JsValue::from_str(&e))?;
        let caller = account_id.map(CallerIdentity::new);
        let result = self.service.lookup(caller.as_ref(), slide_id, day);
        to_js_response(ServiceResponse::from_result(result))
    }
}

impl SlideWorker {
    pub fn with_config(daily_limit: u32, config: ExportConfig) -> Self {
        Self {
            service: ExportService::new(
                SlideExporter::new(config),
                InMemorySlideStore::new(),
                InMemoryQuotaGate::new(daily_limit),
            ),
        }
    }
}

fn to_js_response(response: ServiceResponse) -> Result<JsValue, JsValue> {
    let object = js_sys::Object::new();
    js_sys::Reflect::set(&object, &"status".into(), &JsValue::from(response.status))?;
    js_sys::Reflect::set(&object, &"contentType".into(), &response.content_type.into())?;
    let disposition = response.content_disposition.map_or(JsValue::NULL, JsValue::from);
    js_sys::Reflect::set(&object, &"contentDisposition".into(), &disposition)?;
    let body = js_sys::Uint8Array::from(response.body.as_slice());
    js_sys::Reflect::set(&object, &"body".into(), &body)?;
    Ok(object.into())
}

/// Explicit `YYYY-MM-DD`, or the current UTC date.
fn resolve_day(day: Option<&str>) -> Result<NaiveDate, String> {
    match day {
        Some(day) => parse_day(day),
        None => {
            let now = js_sys::Date::new_0();
            NaiveDate::from_ymd_opt(
                now.get_utc_full_year() as i32,
                now.get_utc_month() + 1,
                now.get_utc_date(),
            )
            .ok_or_else(|| "Invalid current date".to_string())
        }
    }
}

fn parse_day(day: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(day.trim(), "%Y-%m-%d").map_err(|e| format!("Invalid day '{}': {}", day, e))
}

/// Result of parsing an uploaded table.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// Input format detected from the filename.
    pub format: String,
    pub headers: Vec<String>,
    /// Data rows after blank rows were dropped.
    pub row_count: usize,
    /// Tab-separated text for the classification step.
    pub text: String,
}

/// Parse an uploaded CSV, XLSX, XLS or JSON file.
///
/// # Arguments
/// * `data` - The raw bytes of the file
/// * `filename` - The original filename (used for format detection)
///
/// # Returns
/// A JavaScript object with the parse result, or throws on error.
#[wasm_bindgen]
pub fn parse_upload(data: &[u8], filename: &str) -> Result<JsValue, JsValue> {
    let result = parse_upload_impl(data, filename).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn parse_upload_impl(data: &[u8], filename: &str) -> Result<UploadResult, String> {
    let format = slide_input::InputFormat::from_filename(filename).map_err(|e| e.to_string())?;
    let parsed = InputParser::new()
        .parse(filename, data)
        .map_err(|e| e.to_string())?;

    Ok(UploadResult {
        format: format.extension().to_string(),
        text: DownstreamFormatter::new().format(&parsed),
        row_count: parsed.row_count(),
        headers: parsed.headers,
    })
}

/// Format already parsed tabular data for the classification step.
///
/// # Arguments
/// * `data` - `{headers, rows}` as returned in a parse
/// * `max_rows` - Data row cap (default: 50)
#[wasm_bindgen]
pub fn format_for_downstream(data: JsValue, max_rows: Option<usize>) -> Result<String, JsValue> {
    let data: ParsedTabularData = serde_wasm_bindgen::from_value(data)
        .map_err(|e| JsValue::from_str(&format!("Invalid table: {}", e)))?;

    Ok(format_for_downstream_impl(&data, max_rows))
}

fn format_for_downstream_impl(data: &ParsedTabularData, max_rows: Option<usize>) -> String {
    let formatter = match max_rows {
        Some(rows) => DownstreamFormatter::new().with_max_rows(rows),
        None => DownstreamFormatter::new(),
    };
    formatter.format(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::CellValue;

    #[test]
    fn test_parse_upload_csv() {
        let result = parse_upload_impl(b"Region,Revenue\nEMEA,120\n,\nAPAC,95\n", "sales.csv").unwrap();

        assert_eq!(result.format, "csv");
        assert_eq!(result.headers, vec!["Region", "Revenue"]);
        assert_eq!(result.row_count, 2);
        assert_eq!(result.text, "Region\tRevenue\nEMEA\t120\nAPAC\t95");
    }

    #[test]
    fn test_parse_upload_rejects_unknown_extension() {
        let err = parse_upload_impl(b"hello", "notes.txt").unwrap_err();
        assert!(err.contains("txt"));
    }

    #[test]
    fn test_format_for_downstream_caps_rows() {
        let rows = (0..3).map(|i| vec![CellValue::Number(i as f64)]).collect();
        let data = ParsedTabularData::new(vec!["n".to_string()], rows);

        assert_eq!(format_for_downstream_impl(&data, Some(1)), "n\n0\n... and 2 more rows");
        assert_eq!(format_for_downstream_impl(&data, None), "n\n0\n1\n2");
    }

    #[test]
    fn test_parse_day() {
        assert_eq!(parse_day("2025-06-02"), Ok(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()));
        assert!(parse_day("06/02/2025").is_err());
    }

    #[test]
    fn test_worker_round_trip_natively() {
        let worker = SlideWorker::with_config(1, ExportConfig::default());
        worker.service.store().insert(SlideRecord {
            slide_id: "deadbeefcafe".to_string(),
            owner_id: "alice".to_string(),
            archetype_id: "narrative".to_string(),
            template_props: TemplateProps::with_title("Plan"),
        });
        let day = parse_day("2025-06-02").unwrap();
        let alice = CallerIdentity::new("alice");

        let first = ServiceResponse::from_result(worker.service.lookup(Some(&alice), "deadbeefcafe", day));
        assert_eq!(first.status, 200);
        assert_eq!(
            first.content_disposition.as_deref(),
            Some("attachment; filename=\"slidecraft-deadbeef.pptx\"")
        );

        let second = ServiceResponse::from_result(worker.service.lookup(Some(&alice), "deadbeefcafe", day));
        assert_eq!(second.status, 429);
    }
}
