//! OperationOutcome, the FHIR error payload.
//!
//! Servers attach an OperationOutcome to most non-2xx responses (and to some auth
//! endpoints). Only the human-readable parts are modelled.

use crate::{decode_wire, expect_resource_type, FhirResult};
use serde::Deserialize;

/// One issue of an OperationOutcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Issue {
    pub severity: String,
    pub code: String,
    pub details: Option<String>,
    pub diagnostics: Option<String>,
}

impl Issue {
    /// `details.text`, then `diagnostics`, then the issue code.
    pub fn message(&self) -> &str {
        self.details
            .as_deref()
            .or(self.diagnostics.as_deref())
            .unwrap_or(&self.code)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationOutcomeData {
    pub issues: Vec<Issue>,
}

impl OperationOutcomeData {
    /// All issue messages joined with `"; "`.
    pub fn message(&self) -> String {
        self.issues
            .iter()
            .map(Issue::message)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// OperationOutcome operations.
pub struct OperationOutcome;

impl OperationOutcome {
    pub const RESOURCE_TYPE: &'static str = "OperationOutcome";

    pub fn from_value(value: serde_json::Value) -> FhirResult<OperationOutcomeData> {
        let wire: OperationOutcomeWire = decode_wire(value, Self::RESOURCE_TYPE)?;
        expect_resource_type(&wire.resource_type, Self::RESOURCE_TYPE)?;
        Ok(OperationOutcomeData {
            issues: wire
                .issue
                .into_iter()
                .map(|i| Issue {
                    severity: i.severity,
                    code: i.code,
                    details: i.details.and_then(|d| d.text),
                    diagnostics: i.diagnostics,
                })
                .collect(),
        })
    }

    /// Best-effort message extraction from an arbitrary response body.
    ///
    /// Returns `None` when the body is not an OperationOutcome.
    pub fn message_from_body(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        let outcome = Self::from_value(value).ok()?;
        let message = outcome.message();
        (!message.is_empty()).then_some(message)
    }
}

#[derive(Debug, Deserialize)]
struct OperationOutcomeWire {
    #[serde(rename = "resourceType")]
    resource_type: String,

    #[serde(default)]
    issue: Vec<IssueWire>,
}

#[derive(Debug, Deserialize)]
struct IssueWire {
    severity: String,
    code: String,
    #[serde(default)]
    details: Option<IssueDetailsWire>,
    #[serde(default)]
    diagnostics: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueDetailsWire {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_details_text() {
        let body = r#"{"resourceType":"OperationOutcome","issue":[
            {"severity":"error","code":"invalid","details":{"text":"User not found"}},
            {"severity":"error","code":"processing","diagnostics":"trace id 42"}
        ]}"#;
        assert_eq!(
            OperationOutcome::message_from_body(body).as_deref(),
            Some("User not found; trace id 42")
        );
    }

    #[test]
    fn non_outcome_bodies_yield_none() {
        assert_eq!(OperationOutcome::message_from_body("Bad Gateway"), None);
        assert_eq!(
            OperationOutcome::message_from_body(r#"{"resourceType":"Patient","id":"x"}"#),
            None
        );
        assert_eq!(
            OperationOutcome::message_from_body(r#"{"resourceType":"OperationOutcome"}"#),
            None
        );
    }
}
