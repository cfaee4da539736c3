//! FHIR-aligned patient wire models and translation helpers.
//!
//! Responsibilities:
//! - Define public domain-level types for patient demographics
//! - Define the wire model matching the FHIR R4 JSON shape
//! - Translate wire to domain, validating the id, gender and birth date
//!
//! Notes:
//! - Patients are read-only in this application; there is no render path back to JSON
//! - The flat domain struct keeps every name, but the first is treated as primary

use crate::datatypes::{ContactPoint, ContactPointWire, Identifier, IdentifierWire};
use crate::date::{self, FhirDate};
use crate::{decode_wire, expect_resource_type, FhirError, FhirResult};
use medview_types::ResourceId;
use serde::Deserialize;

/// Identifier system for US social security numbers, shown as the national ID.
pub const US_SSN_SYSTEM: &str = "http://hl7.org/fhir/sid/us-ssn";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameUse {
    /// Official name.
    Official,
    /// Usual/preferred name.
    Usual,
    /// Temporary name.
    Temp,
    /// Nickname or informal name.
    Nickname,
    /// Anonymous name.
    Anonymous,
    /// Old name (no longer in use).
    Old,
    /// Maiden name.
    Maiden,
}

impl NameUse {
    /// Parse from FHIR wire format string.
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "official" => Some(NameUse::Official),
            "usual" => Some(NameUse::Usual),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// Administrative gender.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// FHIR code for this gender.
    pub fn as_code(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> FhirResult<Self> {
        match s {
            "male" => Ok(AdministrativeGender::Male),
            "female" => Ok(AdministrativeGender::Female),
            "other" => Ok(AdministrativeGender::Other),
            "unknown" => Ok(AdministrativeGender::Unknown),
            other => Err(FhirError::Translation(format!(
                "Patient.gender: unknown code '{other}'"
            ))),
        }
    }
}

/// A single human name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HumanName {
    pub use_type: Option<NameUse>,
    pub family: Option<String>,
    pub given: Vec<String>,
}

/// Domain-level carrier for patient data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientData {
    /// Server-assigned logical id.
    pub id: ResourceId,

    /// All names, in server order. The first is the primary name.
    pub names: Vec<HumanName>,

    /// Date of birth at whatever precision the server recorded.
    pub birth_date: Option<FhirDate>,

    pub gender: Option<AdministrativeGender>,

    /// `None` when the server omits the flag.
    pub active: Option<bool>,

    pub telecom: Vec<ContactPoint>,

    pub identifiers: Vec<Identifier>,
}

impl PatientData {
    /// Family name of the primary name.
    pub fn family(&self) -> Option<&str> {
        self.names.first().and_then(|n| n.family.as_deref())
    }

    /// Given names of the primary name.
    pub fn given(&self) -> &[String] {
        self.names.first().map(|n| n.given.as_slice()).unwrap_or(&[])
    }

    /// "Given Given Family" for list rows.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = self.given().iter().map(String::as_str).collect();
        if let Some(family) = self.family() {
            parts.push(family);
        }
        parts.join(" ")
    }

    /// Value of the identifier issued under `system`.
    pub fn identifier_value(&self, system: &str) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.system.as_deref() == Some(system))
            .and_then(|i| i.value.as_deref())
    }

    /// National ID (US SSN system).
    pub fn national_id(&self) -> Option<&str> {
        self.identifier_value(US_SSN_SYSTEM)
    }

    /// First phone number.
    pub fn phone(&self) -> Option<&str> {
        self.telecom
            .iter()
            .find(|t| t.system.as_deref() == Some("phone"))
            .and_then(|t| t.value.as_deref())
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(false)
    }
}

// ============================================================================
// Public Patient operations
// ============================================================================

/// Patient resource operations.
///
/// This is a zero-sized type used for namespacing patient-related operations.
pub struct Patient;

impl Patient {
    /// FHIR resource type name.
    pub const RESOURCE_TYPE: &'static str = "Patient";

    /// Parse a patient resource from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not JSON,
    /// - any read field has an unexpected type (the error names its path),
    /// - resourceType is not "Patient",
    /// - the id, gender or birth date is invalid.
    pub fn parse(json_text: &str) -> FhirResult<PatientData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Translate an already-parsed JSON resource.
    pub fn from_value(value: serde_json::Value) -> FhirResult<PatientData> {
        let wire: PatientWire = decode_wire(value, Self::RESOURCE_TYPE)?;
        expect_resource_type(&wire.resource_type, Self::RESOURCE_TYPE)?;
        wire_to_domain(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    name: Vec<HumanNameWire>,

    #[serde(rename = "birthDate", default)]
    birth_date: Option<String>,

    #[serde(default)]
    gender: Option<String>,

    #[serde(default)]
    active: Option<bool>,

    #[serde(default)]
    telecom: Vec<ContactPointWire>,

    #[serde(default)]
    identifier: Vec<IdentifierWire>,
}

#[derive(Clone, Debug, Deserialize)]
struct HumanNameWire {
    #[serde(rename = "use", default)]
    use_type: Option<String>,

    #[serde(default)]
    family: Option<String>,

    #[serde(default)]
    given: Vec<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PatientWire) -> FhirResult<PatientData> {
    let id = wire
        .id
        .ok_or_else(|| FhirError::InvalidInput("Patient has no id".into()))?;
    let id = ResourceId::parse(&id)?;

    let names = wire
        .name
        .into_iter()
        .map(|n| HumanName {
            use_type: n.use_type.as_deref().and_then(NameUse::from_wire),
            family: n.family,
            given: n.given,
        })
        .collect();

    let gender = wire
        .gender
        .as_deref()
        .map(AdministrativeGender::from_wire)
        .transpose()?;

    Ok(PatientData {
        id,
        names,
        birth_date: date::parse_optional(wire.birth_date, "Patient.birthDate")?,
        gender,
        active: wire.active,
        telecom: wire.telecom.into_iter().map(ContactPoint::from).collect(),
        identifiers: wire.identifier.into_iter().map(Identifier::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "resourceType": "Patient",
        "id": "0195b69b-f52e-7209",
        "meta": {"versionId": "3", "lastUpdated": "2025-03-20T13:58:04.099Z"},
        "active": true,
        "name": [
            {"use": "official", "family": "Williams", "given": ["Sarah", "Jane"]},
            {"use": "nickname", "given": ["Sally"]}
        ],
        "gender": "female",
        "birthDate": "1992-03-20",
        "telecom": [
            {"system": "email", "value": "sarah@example.org"},
            {"system": "phone", "value": "555-0100", "use": "mobile"}
        ],
        "identifier": [
            {"system": "http://hospital.example.org/mrn", "value": "MRN-1"},
            {"system": "http://hl7.org/fhir/sid/us-ssn", "value": "999-12-3456"}
        ]
    }"#;

    #[test]
    fn parses_full_patient() {
        let patient = Patient::parse(SAMPLE).expect("parse patient");
        assert_eq!(patient.id.as_str(), "0195b69b-f52e-7209");
        assert_eq!(patient.family(), Some("Williams"));
        assert_eq!(patient.given(), ["Sarah", "Jane"]);
        assert_eq!(patient.names[0].use_type, Some(NameUse::Official));
        assert_eq!(patient.names.len(), 2);
        assert_eq!(patient.gender, Some(AdministrativeGender::Female));
        assert!(patient.is_active());
        assert_eq!(patient.display_name(), "Sarah Jane Williams");
        assert_eq!(patient.national_id(), Some("999-12-3456"));
        assert_eq!(patient.phone(), Some("555-0100"));
        assert_eq!(patient.birth_date.map(|d| d.to_string()).as_deref(), Some("1992-03-20"));
    }

    #[test]
    fn parses_minimal_patient() {
        let patient =
            Patient::parse(r#"{"resourceType":"Patient","id":"p1"}"#).expect("minimal patient");
        assert_eq!(patient.display_name(), "");
        assert!(patient.given().is_empty());
        assert!(patient.national_id().is_none());
        assert!(patient.phone().is_none());
        assert!(patient.active.is_none());
        assert!(!patient.is_active());
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = Patient::parse(r#"{"resourceType":"Practitioner","id":"p1"}"#)
            .expect_err("should reject Practitioner");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Patient"));
                assert!(msg.contains("Practitioner"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_field_type_reports_path() {
        let err = Patient::parse(
            r#"{"resourceType":"Patient","id":"p1","name":[{"given":"Sarah"}]}"#,
        )
        .expect_err("given must be an array");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("name[0].given"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_id_and_unknown_gender() {
        assert!(matches!(
            Patient::parse(r#"{"resourceType":"Patient"}"#),
            Err(FhirError::InvalidInput(_))
        ));
        assert!(matches!(
            Patient::parse(r#"{"resourceType":"Patient","id":"p1","gender":"robot"}"#),
            Err(FhirError::Translation(_))
        ));
    }

    #[test]
    fn unknown_name_use_is_ignored() {
        let patient = Patient::parse(
            r#"{"resourceType":"Patient","id":"p1","name":[{"use":"future","family":"X"}]}"#,
        )
        .expect("unknown use is tolerated");
        assert_eq!(patient.names[0].use_type, None);
        assert_eq!(patient.family(), Some("X"));
    }
}
