//! Service-boundary errors and their HTTP translation.

use slide_core::ErrorKind;
use thiserror::Error;

/// Errors returned by the export service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No authenticated caller.
    #[error("Unauthorized")]
    Unauthorized,

    /// The slide does not exist or belongs to another account.
    #[error("Slide not found")]
    NotFound,

    /// The caller's daily export allowance is used up.
    #[error("Daily export limit reached")]
    QuotaExceeded,

    #[error(transparent)]
    Export(#[from] slide_core::Error),
}

impl ServiceError {
    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        match self {
            ServiceError::Unauthorized => 401,
            ServiceError::NotFound => 404,
            ServiceError::QuotaExceeded => 429,
            ServiceError::Export(e) => match e.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::Generation => 500,
            },
        }
    }

    /// Whether the failure is ours rather than the caller's.
    pub fn is_internal(&self) -> bool {
        self.status() >= 500
    }

    /// JSON body `{"error": message}`.
    pub fn body(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slide_core::Error;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::Unauthorized.status(), 401);
        assert_eq!(ServiceError::NotFound.status(), 404);
        assert_eq!(ServiceError::QuotaExceeded.status(), 429);
        assert_eq!(ServiceError::from(Error::InvalidRequest("slideId".into())).status(), 400);
        assert_eq!(ServiceError::from(Error::EmptyFile("a.csv".into())).status(), 400);
        assert_eq!(ServiceError::from(Error::UnknownArchetype("pie".into())).status(), 500);
    }

    #[test]
    fn test_only_generation_failures_are_internal() {
        assert!(ServiceError::from(Error::UnknownArchetype("pie".into())).is_internal());
        assert!(!ServiceError::from(Error::InvalidRequest("slideId".into())).is_internal());
        assert!(!ServiceError::QuotaExceeded.is_internal());
    }

    #[test]
    fn test_body_is_error_json() {
        let body = ServiceError::from(Error::UnknownArchetype("pie".into())).body();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();

        assert_eq!(value["error"], "Unknown archetype: pie");
        assert_eq!(value.as_object().unwrap().len(), 1);
    }
}
