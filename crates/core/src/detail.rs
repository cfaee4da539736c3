//! Patient detail screen state.
//!
//! A detail load reads the patient, then searches the patient's diagnostic reports
//! with their result observations included in the same Bundle. Observations are
//! attached to the reports that reference them; the join is recomputed on every
//! load and never stored elsewhere.

use crate::generation::{Generation, Ticket};
use fhir::{
    DiagnosticReport, DiagnosticReportData, ObservationData, Patient, PatientData, Reference,
    ResourceId,
};
use medview_client::{ClientResult, ResourceClient, SearchParams};

/// A diagnostic report with the observations among its results.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportWithObservations {
    pub report: DiagnosticReportData,
    pub observations: Vec<ObservationData>,
}

/// Everything one detail load fetches.
///
/// The report search runs after the patient read and may fail on its own; the
/// patient is kept either way.
#[derive(Debug)]
pub struct DetailData {
    pub patient: PatientData,
    pub reports: ClientResult<Vec<ReportWithObservations>>,
}

/// Attach to each report the observations whose id is the trailing segment of one of
/// its result references.
///
/// Reports keep server order, as do the observations under each report. An
/// observation referenced by several reports appears under each of them.
pub fn join_reports(
    reports: Vec<DiagnosticReportData>,
    observations: &[ObservationData],
) -> Vec<ReportWithObservations> {
    reports
        .into_iter()
        .map(|report| {
            let observations = observations
                .iter()
                .filter(|o| report.references_result(&o.id))
                .cloned()
                .collect();
            ReportWithObservations {
                report,
                observations,
            }
        })
        .collect()
}

/// `subject=Patient/<id>&_include=DiagnosticReport:result`
pub fn report_search_params(patient_id: &ResourceId) -> SearchParams {
    SearchParams::new()
        .param(
            "subject",
            Reference::new(Patient::RESOURCE_TYPE, patient_id.clone()).to_string(),
        )
        .include(DiagnosticReport::INCLUDE_RESULTS)
}

/// Read the patient, then fetch and join its reports.
///
/// # Errors
///
/// Fails only when the patient read fails. A failed report search is carried in
/// [`DetailData::reports`].
pub async fn fetch_detail(
    client: &dyn ResourceClient,
    patient_id: &ResourceId,
) -> ClientResult<DetailData> {
    let patient = client.read_patient(patient_id).await?;
    let reports = fetch_reports(client, patient_id).await;
    Ok(DetailData { patient, reports })
}

async fn fetch_reports(
    client: &dyn ResourceClient,
    patient_id: &ResourceId,
) -> ClientResult<Vec<ReportWithObservations>> {
    let bundle = client
        .search(DiagnosticReport::RESOURCE_TYPE, &report_search_params(patient_id))
        .await?;
    let (reports, observations) = bundle.into_reports_and_observations();
    tracing::debug!(
        patient = %patient_id,
        reports = reports.len(),
        observations = observations.len(),
        "patient reports fetched"
    );
    Ok(join_reports(reports, &observations))
}

/// Patient detail screen state.
#[derive(Debug)]
pub struct PatientDetail {
    patient_id: ResourceId,
    patient: Option<PatientData>,
    reports: Vec<ReportWithObservations>,
    error: Option<String>,
    loading: bool,
    generation: Generation,
}

impl PatientDetail {
    /// A fresh screen starts out loading.
    pub fn new(patient_id: ResourceId) -> Self {
        Self {
            patient_id,
            patient: None,
            reports: Vec::new(),
            error: None,
            loading: true,
            generation: Generation::new(),
        }
    }

    pub fn patient_id(&self) -> &ResourceId {
        &self.patient_id
    }

    pub fn patient(&self) -> Option<&PatientData> {
        self.patient.as_ref()
    }

    pub fn reports(&self) -> &[ReportWithObservations] {
        &self.reports
    }

    /// Message of the last failed load.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_load(&mut self) -> Ticket {
        self.loading = true;
        self.generation.issue()
    }

    /// Apply the outcome of a detail load. Superseded outcomes are dropped.
    pub fn finish_load(&mut self, ticket: Ticket, outcome: ClientResult<DetailData>) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, patient = %self.patient_id, "dropping superseded detail");
            return false;
        }
        self.loading = false;
        let reports = match outcome {
            Ok(data) => {
                self.patient = Some(data.patient);
                data.reports
            }
            Err(e) => Err(e),
        };
        match reports {
            Ok(reports) => {
                self.reports = reports;
                self.error = None;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    patient = %self.patient_id,
                    "Error fetching patient data"
                );
                self.error = Some(e.to_string());
            }
        }
        true
    }

    pub async fn load(&mut self, client: &dyn ResourceClient) -> bool {
        let ticket = self.begin_load();
        let outcome = fetch_detail(client, &self.patient_id).await;
        self.finish_load(ticket, outcome)
    }
}
