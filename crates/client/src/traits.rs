//! Seams between screen logic and the remote server.
//!
//! `medview-core` depends on these traits rather than on [`crate::HttpResourceClient`]
//! so controllers can be driven by in-memory fakes in tests.

use crate::auth::{LoginResponse, LoginState};
use crate::search::SearchParams;
use crate::ClientResult;
use async_trait::async_trait;
use fhir::{BundleData, Patient, PatientData, Resource, ResourceId};

/// Read and search FHIR resources.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch one resource as raw JSON.
    async fn read_resource(
        &self,
        resource_type: &str,
        id: &ResourceId,
    ) -> ClientResult<serde_json::Value>;

    /// Run a search and decode the resulting Bundle.
    async fn search(&self, resource_type: &str, params: &SearchParams)
        -> ClientResult<BundleData>;

    /// Run a search and keep only the entry resources.
    async fn search_resources(
        &self,
        resource_type: &str,
        params: &SearchParams,
    ) -> ClientResult<Vec<Resource>> {
        Ok(self.search(resource_type, params).await?.entries)
    }

    async fn read_patient(&self, id: &ResourceId) -> ClientResult<PatientData> {
        let value = self.read_resource(Patient::RESOURCE_TYPE, id).await?;
        Ok(Patient::from_value(value)?)
    }
}

/// Password login and sign-out.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Begin a login. The answer carries either a code or memberships to choose from.
    async fn start_login(&self, email: &str, password: &str) -> ClientResult<LoginResponse>;

    /// Pick a membership for a login that returned several.
    async fn select_profile(&self, login: &str, membership_id: &str)
        -> ClientResult<LoginResponse>;

    /// Exchange an authorization code for tokens and persist them.
    async fn process_code(&self, code: &str) -> ClientResult<LoginState>;

    /// Revoke the session on the server (best effort) and forget the tokens.
    async fn sign_out(&self) -> ClientResult<()>;

    fn is_authenticated(&self) -> bool;
}
