//! FHIR Observation wire model and translation.
//!
//! Observations arrive as `_include`d entries of a DiagnosticReport search and are
//! attached to their reports by reference. Only the value-quantity form of
//! `value[x]` is displayed; other value types decode but are not carried.

use crate::datatypes::{
    CodeableConcept, CodeableConceptWire, Quantity, QuantityWire, ReferenceRange,
    ReferenceRangeWire, ReferenceWire, ResourceLink,
};
use crate::{decode_wire, expect_resource_type, FhirError, FhirResult};
use medview_types::ResourceId;
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// Observation status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl ObservationStatus {
    pub fn as_code(self) -> &'static str {
        match self {
            ObservationStatus::Registered => "registered",
            ObservationStatus::Preliminary => "preliminary",
            ObservationStatus::Final => "final",
            ObservationStatus::Amended => "amended",
            ObservationStatus::Corrected => "corrected",
            ObservationStatus::Cancelled => "cancelled",
            ObservationStatus::EnteredInError => "entered-in-error",
            ObservationStatus::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> FhirResult<Self> {
        Ok(match s {
            "registered" => ObservationStatus::Registered,
            "preliminary" => ObservationStatus::Preliminary,
            "final" => ObservationStatus::Final,
            "amended" => ObservationStatus::Amended,
            "corrected" => ObservationStatus::Corrected,
            "cancelled" => ObservationStatus::Cancelled,
            "entered-in-error" => ObservationStatus::EnteredInError,
            "unknown" => ObservationStatus::Unknown,
            other => {
                return Err(FhirError::Translation(format!(
                    "Observation.status: unknown code '{other}'"
                )))
            }
        })
    }
}

/// Clinical interpretation of an observation value.
///
/// R4 defines `interpretation` as a list of concepts, but some servers send a bare
/// string; both forms are accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Interpretation {
    Text(String),
    Concepts(Vec<CodeableConcept>),
}

impl Interpretation {
    /// Human-readable summary, or `None` when nothing displayable is present.
    ///
    /// Concepts contribute their best label and are joined with `", "`.
    pub fn summary(&self) -> Option<String> {
        match self {
            Interpretation::Text(text) => Some(text.clone()).filter(|t| !t.is_empty()),
            Interpretation::Concepts(concepts) => {
                let labels: Vec<&str> =
                    concepts.iter().filter_map(CodeableConcept::label).collect();
                if labels.is_empty() {
                    None
                } else {
                    Some(labels.join(", "))
                }
            }
        }
    }
}

/// Domain-level carrier for an observation.
#[derive(Clone, Debug, PartialEq)]
pub struct ObservationData {
    pub id: ResourceId,
    pub status: ObservationStatus,
    pub code: Option<CodeableConcept>,
    pub value_quantity: Option<Quantity>,
    pub reference_ranges: Vec<ReferenceRange>,
    pub categories: Vec<CodeableConcept>,
    pub performers: Vec<ResourceLink>,
    pub interpretation: Option<Interpretation>,
}

impl ObservationData {
    /// Numeric value, if the observation carries a quantity with a value.
    pub fn value(&self) -> Option<f64> {
        self.value_quantity.as_ref().and_then(|q| q.value)
    }
}

// ============================================================================
// Public Observation operations
// ============================================================================

/// Observation resource operations.
pub struct Observation;

impl Observation {
    pub const RESOURCE_TYPE: &'static str = "Observation";

    /// Parse an observation from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the JSON does not describe a valid Observation.
    pub fn parse(json_text: &str) -> FhirResult<ObservationData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Translate an already-parsed JSON resource.
    pub fn from_value(value: serde_json::Value) -> FhirResult<ObservationData> {
        let wire: ObservationWire = decode_wire(value, Self::RESOURCE_TYPE)?;
        expect_resource_type(&wire.resource_type, Self::RESOURCE_TYPE)?;
        wire_to_domain(wire)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
struct ObservationWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    id: Option<String>,

    status: String,

    #[serde(default)]
    code: Option<CodeableConceptWire>,

    #[serde(rename = "valueQuantity", default)]
    value_quantity: Option<QuantityWire>,

    #[serde(rename = "referenceRange", default)]
    reference_range: Vec<ReferenceRangeWire>,

    #[serde(default)]
    category: Vec<CodeableConceptWire>,

    #[serde(default)]
    performer: Vec<ReferenceWire>,

    #[serde(default)]
    interpretation: Option<InterpretationWire>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum InterpretationWire {
    Text(String),
    Concepts(Vec<CodeableConceptWire>),
}

fn wire_to_domain(wire: ObservationWire) -> FhirResult<ObservationData> {
    let id = wire
        .id
        .ok_or_else(|| FhirError::InvalidInput("Observation has no id".into()))?;

    let interpretation = wire.interpretation.map(|i| match i {
        InterpretationWire::Text(text) => Interpretation::Text(text),
        InterpretationWire::Concepts(concepts) => {
            Interpretation::Concepts(concepts.into_iter().map(CodeableConcept::from).collect())
        }
    });

    Ok(ObservationData {
        id: ResourceId::parse(&id)?,
        status: ObservationStatus::from_wire(&wire.status)?,
        code: wire.code.map(CodeableConcept::from),
        value_quantity: wire.value_quantity.map(Quantity::from),
        reference_ranges: wire
            .reference_range
            .into_iter()
            .map(ReferenceRange::from)
            .collect(),
        categories: wire.category.into_iter().map(CodeableConcept::from).collect(),
        performers: wire.performer.into_iter().map(ResourceLink::from).collect(),
        interpretation,
    })
}
