//! FHIR DiagnosticReport wire model and translation.

use crate::datatypes::{CodeableConcept, CodeableConceptWire, ReferenceWire, ResourceLink};
use crate::date::{self, FhirDate};
use crate::{decode_wire, expect_resource_type, FhirError, FhirResult};
use medview_types::ResourceId;
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Diagnostic report status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportStatus {
    Registered,
    Partial,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Appended,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl ReportStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            ReportStatus::Registered => "registered",
            ReportStatus::Partial => "partial",
            ReportStatus::Preliminary => "preliminary",
            ReportStatus::Final => "final",
            ReportStatus::Amended => "amended",
            ReportStatus::Corrected => "corrected",
            ReportStatus::Appended => "appended",
            ReportStatus::Cancelled => "cancelled",
            ReportStatus::EnteredInError => "entered-in-error",
            ReportStatus::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> FhirResult<Self> {
        Ok(match s {
            "registered" => ReportStatus::Registered,
            "partial" => ReportStatus::Partial,
            "preliminary" => ReportStatus::Preliminary,
            "final" => ReportStatus::Final,
            "amended" => ReportStatus::Amended,
            "corrected" => ReportStatus::Corrected,
            "appended" => ReportStatus::Appended,
            "cancelled" => ReportStatus::Cancelled,
            "entered-in-error" => ReportStatus::EnteredInError,
            "unknown" => ReportStatus::Unknown,
            other => {
                return Err(FhirError::Translation(format!(
                    "DiagnosticReport.status: unknown code '{other}'"
                )))
            }
        })
    }
}

/// Domain-level carrier for a diagnostic report.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticReportData {
    pub id: ResourceId,
    pub status: ReportStatus,
    pub code: Option<CodeableConcept>,
    pub categories: Vec<CodeableConcept>,
    pub subject: Option<ResourceLink>,
    pub effective: Option<FhirDate>,
    pub conclusion: Option<String>,
    /// Result references (`Observation/<id>`), unparsed.
    pub results: Vec<ResourceLink>,
}

impl DiagnosticReportData {
    /// Report name (`code.text`).
    pub fn name(&self) -> Option<&str> {
        self.code.as_ref().and_then(|c| c.text.as_deref())
    }

    /// True if any result reference ends in `/<id>`.
    pub fn references_result(&self, id: &ResourceId) -> bool {
        self.results.iter().any(|r| {
            r.reference
                .as_deref()
                .is_some_and(|reference| medview_types::trailing_segment(reference) == id.as_str())
        })
    }
}

// ============================================================================
// Public DiagnosticReport operations
// ============================================================================

/// DiagnosticReport resource operations.
pub struct DiagnosticReport;

impl DiagnosticReport {
    pub const RESOURCE_TYPE: &'static str = "DiagnosticReport";

    /// `_include` directive that pulls result observations into a report search.
    pub const INCLUDE_RESULTS: &'static str = "DiagnosticReport:result";

    /// Parse a report from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not describe a valid DiagnosticReport.
    pub fn parse(json_text: &str) -> FhirResult<DiagnosticReportData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> FhirResult<DiagnosticReportData> {
        let wire: DiagnosticReportWire = decode_wire(value, Self::RESOURCE_TYPE)?;
        expect_resource_type(&wire.resource_type, Self::RESOURCE_TYPE)?;
        wire_to_domain(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct DiagnosticReportWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    id: Option<String>,

    status: String,

    #[serde(default)]
    code: Option<CodeableConceptWire>,

    #[serde(default)]
    category: Vec<CodeableConceptWire>,

    #[serde(default)]
    subject: Option<ReferenceWire>,

    #[serde(rename = "effectiveDateTime", default)]
    effective_date_time: Option<String>,

    #[serde(default)]
    conclusion: Option<String>,

    #[serde(default)]
    result: Vec<ReferenceWire>,
}

fn wire_to_domain(wire: DiagnosticReportWire) -> FhirResult<DiagnosticReportData> {
    let id = wire
        .id
        .ok_or_else(|| FhirError::InvalidInput("DiagnosticReport has no id".into()))?;

    Ok(DiagnosticReportData {
        id: ResourceId::parse(&id)?,
        status: ReportStatus::from_wire(&wire.status)?,
        code: wire.code.map(CodeableConcept::from),
        categories: wire.category.into_iter().map(CodeableConcept::from).collect(),
        subject: wire.subject.map(ResourceLink::from),
        effective: date::parse_optional(
            wire.effective_date_time,
            "DiagnosticReport.effectiveDateTime",
        )?,
        conclusion: wire.conclusion,
        results: wire.result.into_iter().map(ResourceLink::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "resourceType": "DiagnosticReport",
        "id": "r1",
        "status": "final",
        "code": {"text": "Basic Metabolic Panel"},
        "subject": {"reference": "Patient/p1"},
        "effectiveDateTime": "2024-05-01T09:30:00Z",
        "conclusion": "Mild hyperglycaemia",
        "result": [{"reference": "Observation/5"}, {"reference": "Observation/9"}]
    }"#;

    #[test]
    fn parses_report() {
        let report = DiagnosticReport::parse(SAMPLE).expect("parse report");
        assert_eq!(report.id.as_str(), "r1");
        assert_eq!(report.status, ReportStatus::Final);
        assert_eq!(report.name(), Some("Basic Metabolic Panel"));
        assert_eq!(report.conclusion.as_deref(), Some("Mild hyperglycaemia"));
        assert_eq!(report.effective.map(|d| d.day()), Some(Some(1)));
        assert_eq!(report.results.len(), 2);
    }

    #[test]
    fn references_result_matches_trailing_segment() {
        let report = DiagnosticReport::parse(SAMPLE).expect("parse report");
        assert!(report.references_result(&ResourceId::parse("5").unwrap()));
        assert!(report.references_result(&ResourceId::parse("9").unwrap()));
        assert!(!report.references_result(&ResourceId::parse("7").unwrap()));
        // "15" must not match "Observation/5".
        assert!(!report.references_result(&ResourceId::parse("15").unwrap()));
    }

    #[test]
    fn rejects_bad_effective_date() {
        let err = DiagnosticReport::parse(
            r#"{"resourceType":"DiagnosticReport","id":"r1","status":"final","effectiveDateTime":"yesterday"}"#,
        )
        .expect_err("bad date");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("effectiveDateTime"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }
}
