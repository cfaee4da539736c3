//! Search result Bundles.
//!
//! A search response is a `searchset` Bundle whose entries hold resources of the
//! searched type plus any `_include`d resources. Entries are decoded into the
//! tagged [`Resource`] enum by their `resourceType` discriminator. Resource types
//! this application does not display become [`Resource::Other`] instead of failing
//! the whole page.

use crate::diagnostic_report::{DiagnosticReport, DiagnosticReportData};
use crate::observation::{Observation, ObservationData};
use crate::patient::{Patient, PatientData};
use crate::{decode_wire, expect_resource_type, resource_type_of, FhirError, FhirResult};
use serde::Deserialize;

// ============================================================================
// Public domain-level types
// ============================================================================

/// A decoded resource from a Bundle entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Resource {
    Patient(PatientData),
    DiagnosticReport(DiagnosticReportData),
    Observation(ObservationData),
    /// Any other resource type; only its discriminator and id are kept.
    Other {
        resource_type: String,
        id: Option<String>,
    },
}

impl Resource {
    /// Decode a raw JSON resource by its `resourceType`.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the discriminator is missing or a known resource type
    /// fails to decode.
    pub fn from_value(value: serde_json::Value) -> FhirResult<Self> {
        let resource_type = resource_type_of(&value)
            .ok_or_else(|| FhirError::InvalidInput("resource has no resourceType".into()))?
            .to_owned();

        match resource_type.as_str() {
            Patient::RESOURCE_TYPE => Patient::from_value(value).map(Resource::Patient),
            DiagnosticReport::RESOURCE_TYPE => {
                DiagnosticReport::from_value(value).map(Resource::DiagnosticReport)
            }
            Observation::RESOURCE_TYPE => Observation::from_value(value).map(Resource::Observation),
            _ => {
                let id = value
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned);
                Ok(Resource::Other { resource_type, id })
            }
        }
    }

    /// The `resourceType` discriminator.
    pub fn resource_type(&self) -> &str {
        match self {
            Resource::Patient(_) => Patient::RESOURCE_TYPE,
            Resource::DiagnosticReport(_) => DiagnosticReport::RESOURCE_TYPE,
            Resource::Observation(_) => Observation::RESOURCE_TYPE,
            Resource::Other { resource_type, .. } => resource_type,
        }
    }
}

/// Domain-level carrier for a search Bundle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BundleData {
    /// Bundle type, normally `searchset`.
    pub bundle_type: String,
    /// Total match count when the server reports it.
    pub total: Option<u64>,
    /// Entry resources in server order. Entries without a resource are skipped.
    pub entries: Vec<Resource>,
    /// Entries of a known type that failed to decode, as `entry[i]: reason`.
    pub skipped: Vec<String>,
}

impl BundleData {
    /// Split the bundle into its diagnostic reports and observations, consuming it.
    ///
    /// Server order is preserved within each list; other resource types are dropped.
    pub fn into_reports_and_observations(
        self,
    ) -> (Vec<DiagnosticReportData>, Vec<ObservationData>) {
        let mut reports = Vec::new();
        let mut observations = Vec::new();
        for resource in self.entries {
            match resource {
                Resource::DiagnosticReport(r) => reports.push(r),
                Resource::Observation(o) => observations.push(o),
                _ => {}
            }
        }
        (reports, observations)
    }
}

// ============================================================================
// Public Bundle operations
// ============================================================================

/// Bundle operations.
pub struct Bundle;

impl Bundle {
    pub const RESOURCE_TYPE: &'static str = "Bundle";

    /// Parse a Bundle from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if the Bundle envelope fails to decode. Entries of a known
    /// type that fail to decode are left out of [`BundleData::entries`] and listed in
    /// [`BundleData::skipped`].
    pub fn parse(json_text: &str) -> FhirResult<BundleData> {
        let value: serde_json::Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> FhirResult<BundleData> {
        let wire: BundleWire = decode_wire(value, Self::RESOURCE_TYPE)?;
        expect_resource_type(&wire.resource_type, Self::RESOURCE_TYPE)?;

        let mut entries = Vec::new();
        let mut skipped = Vec::new();
        for (index, entry) in wire.entry.into_iter().enumerate() {
            let Some(resource) = entry.resource else {
                continue;
            };
            match Resource::from_value(resource) {
                Ok(resource) => entries.push(resource),
                Err(e) => skipped.push(format!("entry[{index}]: {e}")),
            }
        }

        Ok(BundleData {
            bundle_type: wire.bundle_type,
            total: wire.total,
            entries,
            skipped,
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
struct BundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(rename = "type")]
    bundle_type: String,

    #[serde(default)]
    total: Option<u64>,

    #[serde(default)]
    entry: Vec<BundleEntryWire>,
}

#[derive(Debug, Deserialize)]
struct BundleEntryWire {
    #[serde(default)]
    resource: Option<serde_json::Value>,
}
