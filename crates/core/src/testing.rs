//! In-memory FHIR server for controller tests.

use async_trait::async_trait;
use fhir::{
    Bundle, BundleData, DiagnosticReport, DiagnosticReportData, Observation, ObservationData,
    Patient, PatientData, ResourceId,
};
use medview_client::{ClientError, ClientResult, ResourceClient, SearchParams};
use serde_json::{json, Value};
use std::sync::Mutex;

pub(crate) fn patient_json(id: &str, given: &[&str], family: Option<&str>) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "name": [{"given": given, "family": family}],
    })
}

pub(crate) fn patient(id: &str, given: &[&str], family: Option<&str>) -> PatientData {
    Patient::from_value(patient_json(id, given, family)).expect("valid test patient")
}

pub(crate) fn report_json(id: &str, name: &str, results: &[&str]) -> Value {
    let results: Vec<Value> = results.iter().map(|r| json!({"reference": r})).collect();
    json!({
        "resourceType": "DiagnosticReport",
        "id": id,
        "status": "final",
        "code": {"text": name},
        "result": results,
    })
}

pub(crate) fn report(id: &str, name: &str, results: &[&str]) -> DiagnosticReportData {
    DiagnosticReport::from_value(report_json(id, name, results)).expect("valid test report")
}

pub(crate) fn observation_json(id: &str, value: f64, low: f64, high: f64) -> Value {
    json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "code": {"text": format!("obs {id}")},
        "valueQuantity": {"value": value, "unit": "mg/dL"},
        "referenceRange": [{"low": {"value": low}, "high": {"value": high}}],
    })
}

pub(crate) fn observation(id: &str, value: f64, low: f64, high: f64) -> ObservationData {
    Observation::from_value(observation_json(id, value, low, high))
        .expect("valid test observation")
}

fn server_error() -> ClientError {
    ClientError::Server {
        status: 500,
        message: "Internal Server Error".into(),
    }
}

/// Scripted resource server recording every request.
#[derive(Default)]
pub(crate) struct FakeServer {
    patients: Vec<Value>,
    report_entries: Vec<Value>,
    fail_reads: bool,
    fail_searches: bool,
    requests: Mutex<Vec<String>>,
}

impl FakeServer {
    /// `count` patients with ids `p0`, `p1`, ...
    pub(crate) fn with_patients(count: usize) -> Self {
        let patients = (0..count)
            .map(|i| patient_json(&format!("p{i}"), &["Test"], Some(&format!("Patient{i}"))))
            .collect();
        Self {
            patients,
            ..Self::default()
        }
    }

    pub(crate) fn with_patient(mut self, value: Value) -> Self {
        self.patients.push(value);
        self
    }

    /// Entries returned by every DiagnosticReport search.
    pub(crate) fn with_report_entries(mut self, entries: Vec<Value>) -> Self {
        self.report_entries = entries;
        self
    }

    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub(crate) fn failing_searches(mut self) -> Self {
        self.fail_searches = true;
        self
    }

    /// Searches received, as `Type?params`.
    pub(crate) fn searches(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contains('?'))
            .cloned()
            .collect()
    }

    /// Reads received, as `Type/id`.
    pub(crate) fn reads(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| !r.contains('?'))
            .cloned()
            .collect()
    }

    fn record(&self, request: String) {
        self.requests.lock().unwrap().push(request);
    }

    fn bundle(entries: &[Value]) -> ClientResult<BundleData> {
        let entries: Vec<Value> = entries.iter().map(|r| json!({"resource": r})).collect();
        Ok(Bundle::from_value(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "entry": entries,
        }))?)
    }
}

#[async_trait]
impl ResourceClient for FakeServer {
    async fn read_resource(&self, resource_type: &str, id: &ResourceId) -> ClientResult<Value> {
        self.record(format!("{resource_type}/{id}"));
        if self.fail_reads {
            return Err(server_error());
        }
        self.patients
            .iter()
            .find(|p| resource_type == Patient::RESOURCE_TYPE && p["id"] == id.as_str())
            .cloned()
            .ok_or_else(|| ClientError::Server {
                status: 404,
                message: "Not found".into(),
            })
    }

    async fn search(&self, resource_type: &str, params: &SearchParams) -> ClientResult<BundleData> {
        self.record(format!("{resource_type}?{params}"));
        if self.fail_searches {
            return Err(server_error());
        }
        match resource_type {
            Patient::RESOURCE_TYPE => {
                let offset = params
                    .get("_offset")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0usize);
                let count = params
                    .get("_count")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(self.patients.len());
                let page: Vec<Value> =
                    self.patients.iter().skip(offset).take(count).cloned().collect();
                Self::bundle(&page)
            }
            DiagnosticReport::RESOURCE_TYPE => Self::bundle(&self.report_entries),
            _ => Self::bundle(&[]),
        }
    }
}
