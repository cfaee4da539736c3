//! Shared FHIR complex datatypes.
//!
//! Only the subset of each datatype medview displays is modelled. Wire structs are
//! `pub(crate)` so resource modules can embed them; the domain structs are public.

use serde::{Deserialize, Serialize};

// ============================================================================
// Public domain-level types
// ============================================================================

/// A code from a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Coding {
    pub system: Option<String>,
    pub code: Option<String>,
    pub display: Option<String>,
}

/// A concept expressed as zero or more codings plus optional text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeableConcept {
    pub codings: Vec<Coding>,
    pub text: Option<String>,
}

impl CodeableConcept {
    /// Best single label for the concept: `text`, then the first coding's display,
    /// then the first coding's code.
    pub fn label(&self) -> Option<&str> {
        self.text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| self.codings.first().and_then(|c| c.display.as_deref()))
            .or_else(|| self.codings.first().and_then(|c| c.code.as_deref()))
    }

    /// All coding displays joined with `", "`, falling back to `text`.
    pub fn displays_or_text(&self) -> Option<String> {
        let displays: Vec<&str> = self
            .codings
            .iter()
            .filter_map(|c| c.display.as_deref())
            .filter(|d| !d.is_empty())
            .collect();
        if !displays.is_empty() {
            return Some(displays.join(", "));
        }
        self.text.clone().filter(|t| !t.is_empty())
    }
}

/// A measured amount.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Quantity {
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub system: Option<String>,
    pub code: Option<String>,
}

/// A declared normal range for an observation value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceRange {
    pub low: Option<Quantity>,
    pub high: Option<Quantity>,
    /// `type.text`, e.g. "Normal Range".
    pub type_text: Option<String>,
}

impl ReferenceRange {
    pub fn low_value(&self) -> Option<f64> {
        self.low.as_ref().and_then(|q| q.value)
    }

    pub fn high_value(&self) -> Option<f64> {
        self.high.as_ref().and_then(|q| q.value)
    }
}

/// A business identifier such as a national ID or MRN.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    pub system: Option<String>,
    pub value: Option<String>,
}

/// A phone number, email address, or similar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContactPoint {
    pub system: Option<String>,
    pub value: Option<String>,
    pub use_type: Option<String>,
}

/// A reference as it appears on the wire: the raw reference string plus display.
///
/// The reference string is kept unparsed; joins compare its trailing segment, and
/// performers are often display-only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceLink {
    pub reference: Option<String>,
    pub display: Option<String>,
}

// ============================================================================
// Wire types (crate-internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct CodingWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct CodeableConceptWire {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<CodingWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct QuantityWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct ReferenceRangeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<QuantityWire>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<QuantityWire>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub range_type: Option<CodeableConceptWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct IdentifierWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct ContactPointWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Default)]
pub(crate) struct ReferenceWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

// ============================================================================
// Wire -> domain translation
// ============================================================================

impl From<CodingWire> for Coding {
    fn from(w: CodingWire) -> Self {
        Self {
            system: w.system,
            code: w.code,
            display: w.display,
        }
    }
}

impl From<CodeableConceptWire> for CodeableConcept {
    fn from(w: CodeableConceptWire) -> Self {
        Self {
            codings: w.coding.into_iter().map(Coding::from).collect(),
            text: w.text,
        }
    }
}

impl From<QuantityWire> for Quantity {
    fn from(w: QuantityWire) -> Self {
        Self {
            value: w.value,
            unit: w.unit,
            system: w.system,
            code: w.code,
        }
    }
}

impl From<ReferenceRangeWire> for ReferenceRange {
    fn from(w: ReferenceRangeWire) -> Self {
        Self {
            low: w.low.map(Quantity::from),
            high: w.high.map(Quantity::from),
            type_text: w.range_type.and_then(|t| t.text),
        }
    }
}

impl From<IdentifierWire> for Identifier {
    fn from(w: IdentifierWire) -> Self {
        Self {
            system: w.system,
            value: w.value,
        }
    }
}

impl From<ContactPointWire> for ContactPoint {
    fn from(w: ContactPointWire) -> Self {
        Self {
            system: w.system,
            value: w.value,
            use_type: w.use_type,
        }
    }
}

impl From<ReferenceWire> for ResourceLink {
    fn from(w: ReferenceWire) -> Self {
        Self {
            reference: w.reference,
            display: w.display,
        }
    }
}
