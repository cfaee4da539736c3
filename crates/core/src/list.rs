//! Patient list screen state.
//!
//! The list shows one page of patients at a time, optionally filtered by name. Loads
//! are split into [`PatientList::begin_load`] and [`PatientList::finish_load`] so a
//! caller can keep several requests in flight; only the response to the latest
//! request is applied.

use crate::generation::{Generation, Ticket};
use fhir::{Patient, PatientData, Resource, ResourceId};
use medview_client::{ClientResult, ResourceClient, SearchParams};
use medview_types::NonEmptyText;

/// One row of the patient list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatientRow {
    pub id: ResourceId,
    /// Given names joined by spaces, then the family name.
    pub name: String,
}

impl PatientRow {
    pub fn from_patient(patient: &PatientData) -> Self {
        Self {
            id: patient.id.clone(),
            name: patient.display_name(),
        }
    }

    pub fn id_label(&self) -> String {
        format!("ID: {}", self.id)
    }
}

/// A page request issued by [`PatientList::begin_load`].
#[derive(Clone, Debug)]
pub struct PageRequest {
    pub ticket: Ticket,
    pub params: SearchParams,
}

/// Patient list screen state.
#[derive(Debug)]
pub struct PatientList {
    page_size: u32,
    page: u32,
    filter: Option<NonEmptyText>,
    rows: Vec<PatientRow>,
    loading: bool,
    generation: Generation,
}

impl PatientList {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            filter: None,
            rows: Vec::new(),
            loading: false,
            generation: Generation::new(),
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The committed name filter.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_ref().map(NonEmptyText::as_str)
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of patients skipped before the current page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn search_params(&self) -> SearchParams {
        let params = SearchParams::new()
            .count(self.page_size)
            .offset(self.offset());
        match &self.filter {
            Some(name) => params.param("name", name.as_str()),
            None => params,
        }
    }

    pub fn prev_disabled(&self) -> bool {
        self.page == 1 || self.loading
    }

    /// A short page means there is nothing after it.
    pub fn next_disabled(&self) -> bool {
        self.rows.len() < self.page_size as usize || self.loading
    }

    /// Commit debounced search text.
    ///
    /// Blank text clears the filter. Returns true (and resets to page 1) only when the
    /// committed filter differs from the current one; the caller then reloads.
    pub fn commit_filter(&mut self, text: &str) -> bool {
        let filter = NonEmptyText::optional(text);
        if filter == self.filter {
            return false;
        }
        tracing::debug!(?filter, "search filter committed");
        self.filter = filter;
        self.page = 1;
        true
    }

    /// Jump straight to `page` (at least 1), as when a page number is given up front.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Move to the next page. Returns false if the move is not allowed.
    pub fn next_page(&mut self) -> bool {
        if self.next_disabled() {
            return false;
        }
        self.page += 1;
        true
    }

    /// Move to the previous page. Returns false if the move is not allowed.
    pub fn prev_page(&mut self) -> bool {
        if self.prev_disabled() {
            return false;
        }
        self.page -= 1;
        true
    }

    /// Start loading the current page.
    pub fn begin_load(&mut self) -> PageRequest {
        self.loading = true;
        PageRequest {
            ticket: self.generation.issue(),
            params: self.search_params(),
        }
    }

    /// Apply the outcome of a page request.
    ///
    /// Responses to superseded requests are dropped. For the latest request the
    /// loading flag is always cleared; on failure the previous rows are kept.
    /// Returns whether the outcome was applied.
    pub fn finish_load(
        &mut self,
        ticket: Ticket,
        outcome: ClientResult<Vec<PatientData>>,
    ) -> bool {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "dropping superseded patient page");
            return false;
        }
        self.loading = false;
        match outcome {
            Ok(patients) => {
                self.rows = patients.iter().map(PatientRow::from_patient).collect();
            }
            Err(e) => {
                tracing::error!(error = %e, page = self.page, "Error fetching patients");
            }
        }
        true
    }

    /// Load the current page through `client`.
    pub async fn load(&mut self, client: &dyn ResourceClient) -> bool {
        let request = self.begin_load();
        let outcome = fetch_patients(client, &request.params).await;
        self.finish_load(request.ticket, outcome)
    }
}

/// Search patients and keep the Patient entries.
pub async fn fetch_patients(
    client: &dyn ResourceClient,
    params: &SearchParams,
) -> ClientResult<Vec<PatientData>> {
    let resources = client
        .search_resources(Patient::RESOURCE_TYPE, params)
        .await?;
    Ok(resources
        .into_iter()
        .filter_map(|r| match r {
            Resource::Patient(p) => Some(p),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SEARCH_DEBOUNCE;
    use crate::debounce::run_debouncer;
    use crate::testing::{patient, FakeServer};
    use medview_client::ClientError;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[test]
    fn test_offset_follows_page() {
        let mut list = PatientList::new(20);
        assert_eq!(list.offset(), 0);
        for page in 1..=5u32 {
            list.page = page;
            assert_eq!(list.offset(), u64::from(page - 1) * 20);
        }
    }

    #[test]
    fn test_set_page_clamps_to_first_page() {
        let mut list = PatientList::new(20);
        list.set_page(3);
        assert_eq!(list.search_params().to_string(), "_count=20&_offset=40");
        list.set_page(0);
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn test_first_page_request_has_count_and_zero_offset() {
        let list = PatientList::new(20);
        assert_eq!(list.search_params().to_string(), "_count=20&_offset=0");
    }

    #[test]
    fn test_commit_resets_page_only_when_filter_changes() {
        let mut list = PatientList::new(10);
        list.page = 3;
        assert!(list.commit_filter("Mary"));
        assert_eq!(list.page(), 1);
        assert_eq!(list.filter(), Some("Mary"));
        assert_eq!(
            list.search_params().to_string(),
            "_count=10&_offset=0&name=Mary"
        );

        list.page = 2;
        assert!(!list.commit_filter(" Mary "));
        assert_eq!(list.page(), 2);

        assert!(list.commit_filter("   "));
        assert_eq!(list.filter(), None);
        assert!(!list.commit_filter(""));
    }

    #[test]
    fn test_row_display() {
        let row = PatientRow::from_patient(&patient("p1", &["Mary", "Ann"], Some("Smith")));
        assert_eq!(row.name, "Mary Ann Smith");
        assert_eq!(row.id_label(), "ID: p1");
        assert_eq!(PatientRow::from_patient(&patient("p2", &[], Some("Doe"))).name, "Doe");
        assert_eq!(PatientRow::from_patient(&patient("p3", &["Jo"], None)).name, "Jo");
    }

    #[tokio::test]
    async fn test_load_requests_page_and_fills_rows() {
        let server = FakeServer::with_patients(20);
        let mut list = PatientList::new(20);

        assert!(list.load(&server).await);
        assert_eq!(list.rows().len(), 20);
        assert!(!list.is_loading());
        assert_eq!(server.searches(), ["Patient?_count=20&_offset=0"]);
        assert!(list.prev_disabled());
        assert!(!list.next_disabled());

        assert!(list.next_page());
        list.load(&server).await;
        assert_eq!(server.searches()[1], "Patient?_count=20&_offset=20");
        assert!(!list.prev_disabled());
    }

    #[tokio::test]
    async fn test_short_page_disables_next() {
        let server = FakeServer::with_patients(3);
        let mut list = PatientList::new(10);
        list.load(&server).await;
        assert_eq!(list.rows().len(), 3);
        assert!(list.next_disabled());
        assert!(!list.next_page());
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn test_navigation_disabled_while_loading() {
        let mut list = PatientList::new(2);
        list.rows = vec![
            PatientRow::from_patient(&patient("a", &["A"], None)),
            PatientRow::from_patient(&patient("b", &["B"], None)),
        ];
        list.page = 2;
        let _request = list.begin_load();
        assert!(list.is_loading());
        assert!(list.prev_disabled());
        assert!(list.next_disabled());
    }

    #[test]
    fn test_failure_keeps_rows_and_clears_loading() {
        let mut list = PatientList::new(10);
        let first = list.begin_load();
        list.finish_load(first.ticket, Ok(vec![patient("p1", &["Mary"], Some("Smith"))]));

        let second = list.begin_load();
        let applied = list.finish_load(
            second.ticket,
            Err(ClientError::Server {
                status: 500,
                message: "boom".into(),
            }),
        );
        assert!(applied);
        assert!(!list.is_loading());
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].name, "Mary Smith");
    }

    #[test]
    fn test_superseded_response_is_never_applied() {
        let mut list = PatientList::new(10);
        let stale = list.begin_load();
        list.commit_filter("Mary");
        let fresh = list.begin_load();

        assert!(list.finish_load(fresh.ticket, Ok(vec![patient("m1", &["Mary"], None)])));
        assert!(!list.finish_load(stale.ticket, Ok(vec![patient("x1", &["Other"], None)])));
        assert_eq!(list.rows().len(), 1);
        assert_eq!(list.rows()[0].id.as_str(), "m1");
    }

    #[test]
    fn test_stale_response_does_not_clear_loading_of_newer_request() {
        let mut list = PatientList::new(10);
        let stale = list.begin_load();
        let _fresh = list.begin_load();
        list.finish_load(stale.ticket, Ok(vec![]));
        assert!(list.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_typed_search_issues_one_request_from_first_page() {
        let server = FakeServer::with_patients(50);
        let mut list = PatientList::new(10);
        list.set_page(3);
        list.load(&server).await;

        let (keys_tx, keys_rx) = mpsc::channel(16);
        let (commit_tx, mut commits) = mpsc::channel(4);
        let driver = tokio::spawn(run_debouncer(keys_rx, commit_tx, SEARCH_DEBOUNCE));
        for text in ["M", "Ma", "Mar", "Mary"] {
            keys_tx.send(text.to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(SEARCH_DEBOUNCE).await;
        drop(keys_tx);

        while let Some(text) = commits.recv().await {
            if list.commit_filter(&text) {
                list.load(&server).await;
            }
        }
        driver.await.unwrap();

        assert_eq!(list.page(), 1);
        assert_eq!(list.filter(), Some("Mary"));
        assert_eq!(
            server.searches(),
            [
                "Patient?_count=10&_offset=20",
                "Patient?_count=10&_offset=0&name=Mary"
            ]
        );
    }
}
