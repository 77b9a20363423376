//! Request handling for slide exports.

use crate::error::ServiceError;
use crate::store::{QuotaGate, SlideStore};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slide_core::{Error, ExportArtifact, TemplateProps};
use slide_pptx::SlideExporter;

/// Body of a generate call. Every field is required; they are optional here
/// so a missing one is reported as a 400 rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    #[serde(default)]
    pub archetype_id: Option<String>,
    #[serde(default)]
    pub template_props: Option<TemplateProps>,
    #[serde(default)]
    pub slide_id: Option<String>,
}

impl GenerateRequest {
    fn validate(self) -> Result<(String, TemplateProps, String), ServiceError> {
        let archetype_id = required(self.archetype_id, "archetypeId")?;
        let props = self
            .template_props
            .ok_or_else(|| Error::InvalidRequest("missing templateProps".to_string()))?;
        let slide_id = required(self.slide_id, "slideId")?;
        Ok((archetype_id, props, slide_id))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::InvalidRequest(format!("missing {}", field)).into()),
    }
}

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: String,
}

impl CallerIdentity {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}

/// HTTP-shaped outcome of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub status: u16,
    pub content_type: String,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl ServiceResponse {
    pub fn from_result(result: Result<ExportArtifact, ServiceError>) -> Self {
        match result {
            Ok(artifact) => Self {
                status: 200,
                content_disposition: Some(artifact.content_disposition()),
                content_type: artifact.mime_type,
                body: artifact.bytes,
            },
            Err(e) => {
                if e.is_internal() {
                    log::error!("Export failed: {:?}", e);
                } else {
                    log::debug!("Rejected request ({}): {}", e.status(), e);
                }
                Self {
                    status: e.status(),
                    content_type: "application/json".to_string(),
                    content_disposition: None,
                    body: e.body().into_bytes(),
                }
            }
        }
    }
}

/// Runs exports behind auth, ownership and quota checks.
///
/// Every admitted export is reported to the quota gate once it finishes.
#[derive(Debug, Clone)]
pub struct ExportService<S, Q> {
    exporter: SlideExporter,
    store: S,
    quota: Q,
}

impl<S: SlideStore, Q: QuotaGate> ExportService<S, Q> {
    pub fn new(exporter: SlideExporter, store: S, quota: Q) -> Self {
        Self { exporter, store, quota }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn quota(&self) -> &Q {
        &self.quota
    }

    /// Export slide content sent with the request.
    pub fn generate(
        &self,
        caller: Option<&CallerIdentity>,
        request: GenerateRequest,
        day: NaiveDate,
    ) -> Result<ExportArtifact, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthorized)?;
        let (archetype_id, props, slide_id) = request.validate()?;
        self.run(caller, &archetype_id, &props, &slide_id, day)
    }

    /// Export a saved slide owned by the caller.
    pub fn lookup(
        &self,
        caller: Option<&CallerIdentity>,
        slide_id: &str,
        day: NaiveDate,
    ) -> Result<ExportArtifact, ServiceError> {
        let caller = caller.ok_or(ServiceError::Unauthorized)?;
        if slide_id.trim().is_empty() {
            return Err(Error::InvalidRequest("missing slideId".to_string()).into());
        }
        let record = self
            .store
            .find_for_owner(slide_id, &caller.account_id)
            .ok_or(ServiceError::NotFound)?;
        self.run(caller, &record.archetype_id, &record.template_props, &record.slide_id, day)
    }

    fn run(
        &self,
        caller: &CallerIdentity,
        archetype_id: &str,
        props: &TemplateProps,
        slide_id: &str,
        day: NaiveDate,
    ) -> Result<ExportArtifact, ServiceError> {
        if !self.quota.check_and_increment(&caller.account_id, day) {
            return Err(ServiceError::QuotaExceeded);
        }
        let result = self.exporter.export(archetype_id, props, slide_id);
        self.quota.report_completion(&caller.account_id, result.is_ok());
        Ok(result?)
    }
}
