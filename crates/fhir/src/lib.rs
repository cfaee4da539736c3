//! FHIR R4 wire/boundary support for the medview client.
//!
//! This crate provides **wire models** and **translation helpers** for the JSON
//! resources medview reads from a FHIR server:
//! - Patient, DiagnosticReport and Observation
//! - search Bundles, decoded into a tagged [`Resource`] enum
//! - OperationOutcome, for server error messages
//! - the Subscription resource used to open a notification channel
//!
//! Each resource module keeps a private wire struct matching the JSON shape and a
//! public flat domain struct. Decoding happens once, at the data-fetching boundary;
//! everything past this crate works with the typed domain structs.
//!
//! Unlike on-disk formats, server responses carry fields this application never
//! reads (`meta`, `text`, extensions), so wire structs ignore unknown keys. Fields
//! that *are* read are type-checked, and failures report the JSON path of the
//! offending field.

pub mod bundle;
pub mod datatypes;
pub mod date;
pub mod diagnostic_report;
pub mod observation;
pub mod operation_outcome;
pub mod patient;
pub mod subscription;

// Re-export facades
pub use bundle::Bundle;
pub use diagnostic_report::DiagnosticReport;
pub use observation::Observation;
pub use operation_outcome::OperationOutcome;
pub use patient::Patient;
pub use subscription::Subscription;

// Re-export public domain-level types
pub use bundle::{BundleData, Resource};
pub use datatypes::{
    CodeableConcept, Coding, ContactPoint, Identifier, Quantity, ReferenceRange, ResourceLink,
};
pub use date::FhirDate;
pub use diagnostic_report::{DiagnosticReportData, ReportStatus};
pub use observation::{Interpretation, ObservationData, ObservationStatus};
pub use operation_outcome::{Issue, OperationOutcomeData};
pub use patient::{AdministrativeGender, HumanName, NameUse, PatientData, US_SSN_SYSTEM};
pub use subscription::{BindingToken, NotificationData, NotificationKind};

pub use medview_types::{Reference, ResourceId};

use serde::de::DeserializeOwned;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(#[from] medview_types::TextError),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// Decode a JSON value into a wire struct, reporting the failing field path.
///
/// `what` names the resource in the error message, e.g. `"Patient"`.
pub(crate) fn decode_wire<T: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> FhirResult<T> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            Err(FhirError::Translation(format!(
                "{what} schema mismatch at {path}: {source}"
            )))
        }
    }
}

/// Check the `resourceType` discriminator of a decoded wire struct.
pub(crate) fn expect_resource_type(actual: &str, expected: &str) -> FhirResult<()> {
    if actual != expected {
        return Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{expected}', got '{actual}'"
        )));
    }
    Ok(())
}

/// Read the `resourceType` field of a raw resource, if present.
pub fn resource_type_of(value: &serde_json::Value) -> Option<&str> {
    value.get("resourceType").and_then(serde_json::Value::as_str)
}
