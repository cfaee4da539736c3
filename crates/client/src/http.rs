//! HTTP implementation of the client traits, using `reqwest`.

use crate::auth::{
    LoginRequestWire, LoginResponse, LoginResponseWire, LoginState, Pkce, ProfileRequestWire,
    TokenResponseWire, TokenStore,
};
use crate::search::SearchParams;
use crate::traits::{AuthClient, ResourceClient};
use crate::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::Utc;
use fhir::{Bundle, BundleData, OperationOutcome, ResourceId};
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const FHIR_JSON: &str = "application/fhir+json";
const FHIR_PATH: &str = "fhir/R4/";

/// Connection settings for [`HttpResourceClient`].
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Server root, e.g. `http://localhost:8103/`. A trailing `/` is added if missing.
    pub base_url: String,
    /// OAuth client id sent with login and token requests.
    pub client_id: String,
    pub timeout: Duration,
    /// Pause between subscription websocket reconnect attempts.
    pub reconnect_delay: Duration,
}

impl ClientOptions {
    pub fn new(base_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

/// Answer of `GET healthcheck`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    #[serde(default)]
    pub version: Option<String>,
}

/// Client for a Medplum-compatible server.
///
/// Cloning is cheap; clones share the connection pool, token store and pending
/// PKCE verifier.
#[derive(Clone)]
pub struct HttpResourceClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
    tokens: Arc<dyn TokenStore>,
    pkce: Arc<Mutex<Option<Pkce>>>,
}

impl std::fmt::Debug for HttpResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceClient")
            .field("base_url", &self.base_url)
            .field("client_id", &self.options.client_id)
            .finish_non_exhaustive()
    }
}

impl HttpResourceClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL is not http(s), or
    /// [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(options: ClientOptions, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let mut base_url = options.base_url.trim().to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must be http(s): {base_url:?}"
            )));
        }
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            options,
            tokens,
            pkce: Arc::new(Mutex::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// `GET healthcheck`. Does not need a session.
    pub async fn healthcheck(&self) -> ClientResult<HealthStatus> {
        let response = self
            .http
            .get(format!("{}healthcheck", self.base_url))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// `POST fhir/R4/{type}` with a resource body, returning the created resource.
    pub async fn create_resource(
        &self,
        resource_type: &str,
        resource: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        let url = self.fhir_url(resource_type);
        tracing::debug!(%url, "create resource");
        let response = self
            .http
            .post(url)
            .bearer_auth(self.access_token()?)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .header(reqwest::header::CONTENT_TYPE, FHIR_JSON)
            .body(resource.to_string())
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    /// `GET fhir/R4/{path}` for operations that are not plain reads, such as
    /// `Subscription/{id}/$get-ws-binding-token`.
    pub async fn get_fhir(&self, path: &str) -> ClientResult<serde_json::Value> {
        let url = self.fhir_url(path);
        tracing::debug!(%url, "fhir get");
        let response = self
            .http
            .get(url)
            .bearer_auth(self.access_token()?)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    fn fhir_url(&self, path: &str) -> String {
        format!("{}{FHIR_PATH}{path}", self.base_url)
    }

    fn access_token(&self) -> ClientResult<String> {
        self.tokens
            .load()?
            .map(|state| state.access_token)
            .ok_or(ClientError::NotAuthenticated)
    }

    fn pending_pkce(&self) -> ClientResult<std::sync::MutexGuard<'_, Option<Pkce>>> {
        self.pkce
            .lock()
            .map_err(|_| ClientError::Login("PKCE state lock poisoned".into()))
    }
}

/// Turn a non-2xx response into [`ClientError::Server`].
///
/// The message comes from an OperationOutcome body when there is one, else the raw
/// body, else the status reason.
async fn check(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = OperationOutcome::message_from_body(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        } else {
            body
        }
    });
    tracing::debug!(status = status.as_u16(), %message, "server error");
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    async fn read_resource(
        &self,
        resource_type: &str,
        id: &ResourceId,
    ) -> ClientResult<serde_json::Value> {
        self.get_fhir(&format!("{resource_type}/{id}")).await
    }

    async fn search(
        &self,
        resource_type: &str,
        params: &SearchParams,
    ) -> ClientResult<BundleData> {
        let url = self.fhir_url(resource_type);
        tracing::debug!(%url, query = %params, "search");
        let pairs: Vec<(&str, &str)> = params.pairs().collect();
        let response = self
            .http
            .get(url)
            .query(&pairs)
            .bearer_auth(self.access_token()?)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .send()
            .await?;
        let value: serde_json::Value = check(response).await?.json().await?;
        let bundle = Bundle::from_value(value)?;
        for reason in &bundle.skipped {
            tracing::warn!(resource_type, %reason, "skipping undecodable search entry");
        }
        Ok(bundle)
    }
}

#[async_trait]
impl AuthClient for HttpResourceClient {
    async fn start_login(&self, email: &str, password: &str) -> ClientResult<LoginResponse> {
        if self.options.client_id.is_empty() {
            return Err(ClientError::Config("client id is not configured".into()));
        }

        let pkce = Pkce::generate();
        let challenge = pkce.challenge.clone();
        *self.pending_pkce()? = Some(pkce);

        let request = LoginRequestWire {
            email,
            password,
            client_id: &self.options.client_id,
            scope: "openid",
            code_challenge: &challenge,
            code_challenge_method: Pkce::METHOD,
        };

        tracing::debug!(email, "start login");
        let response = self
            .http
            .post(format!("{}auth/login", self.base_url))
            .json(&request)
            .send()
            .await?;
        let wire: LoginResponseWire = check(response).await?.json().await?;
        Ok(wire.into())
    }

    async fn select_profile(
        &self,
        login: &str,
        membership_id: &str,
    ) -> ClientResult<LoginResponse> {
        let request = ProfileRequestWire {
            login,
            profile: membership_id,
        };
        let response = self
            .http
            .post(format!("{}auth/profile", self.base_url))
            .json(&request)
            .send()
            .await?;
        let wire: LoginResponseWire = check(response).await?.json().await?;
        Ok(wire.into())
    }

    async fn process_code(&self, code: &str) -> ClientResult<LoginState> {
        let verifier = self
            .pending_pkce()?
            .take()
            .map(|pkce| pkce.verifier)
            .ok_or_else(|| ClientError::Login("no login in progress".into()))?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", verifier.as_str()),
            ("client_id", self.options.client_id.as_str()),
        ];
        let response = self
            .http
            .post(format!("{}oauth2/token", self.base_url))
            .form(&form)
            .send()
            .await?;
        let wire: TokenResponseWire = check(response).await?.json().await?;
        let state = wire.into_state(Utc::now());
        self.tokens.save(&state)?;
        tracing::info!(profile = ?state.profile, "signed in");
        Ok(state)
    }

    async fn sign_out(&self) -> ClientResult<()> {
        if let Some(state) = self.tokens.load()? {
            let outcome = self
                .http
                .post(format!("{}oauth2/logout", self.base_url))
                .bearer_auth(&state.access_token)
                .send()
                .await;
            let outcome = match outcome {
                Ok(response) => check(response).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "server logout failed; clearing local session");
            }
        }
        self.tokens.clear()?;
        tracing::info!("signed out");
        Ok(())
    }

    fn is_authenticated(&self) -> bool {
        matches!(self.tokens.load(), Ok(Some(ref state)) if !state.is_expired(Utc::now()))
    }
}
