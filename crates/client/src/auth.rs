//! Login, PKCE and token persistence.
//!
//! Password login is a two- or three-step exchange:
//! 1. `POST auth/login` with the credentials and a PKCE challenge; the server
//!    answers with a login id and either an authorization code or a list of
//!    project memberships to choose from,
//! 2. (if memberships) `POST auth/profile` with the chosen membership, which
//!    answers with a code,
//! 3. `POST oauth2/token` exchanging the code and PKCE verifier for tokens.
//!
//! Tokens are persisted through a [`TokenStore`] so a session survives restarts.

use crate::{ClientError, ClientResult};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Mutex;

// ============================================================================
// PKCE
// ============================================================================

/// A PKCE verifier and its S256 challenge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub const METHOD: &'static str = "S256";

    /// Generate a fresh verifier from 32 random bytes.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_verifier(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Derive the challenge for a known verifier.
    pub fn from_verifier(verifier: String) -> Self {
        let digest = Sha256::digest(verifier.as_bytes());
        let challenge = URL_SAFE_NO_PAD.encode(digest);
        Self {
            verifier,
            challenge,
        }
    }
}

// ============================================================================
// Login exchange types
// ============================================================================

/// A project membership the user may sign in as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub id: String,
    pub profile: Option<String>,
    pub project: Option<String>,
}

/// Answer to `auth/login` and `auth/profile`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    pub login: String,
    pub code: Option<String>,
    pub memberships: Vec<Membership>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequestWire<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub client_id: &'a str,
    pub scope: &'a str,
    pub code_challenge: &'a str,
    pub code_challenge_method: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProfileRequestWire<'a> {
    pub login: &'a str,
    pub profile: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponseWire {
    login: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    memberships: Vec<MembershipWire>,
}

#[derive(Debug, Deserialize)]
struct MembershipWire {
    id: String,
    #[serde(default)]
    profile: Option<DisplayReferenceWire>,
    #[serde(default)]
    project: Option<DisplayReferenceWire>,
}

#[derive(Debug, Deserialize)]
struct DisplayReferenceWire {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    display: Option<String>,
}

impl DisplayReferenceWire {
    fn label(self) -> Option<String> {
        self.display.or(self.reference)
    }
}

impl From<LoginResponseWire> for LoginResponse {
    fn from(w: LoginResponseWire) -> Self {
        Self {
            login: w.login,
            code: w.code,
            memberships: w
                .memberships
                .into_iter()
                .map(|m| Membership {
                    id: m.id,
                    profile: m.profile.and_then(DisplayReferenceWire::label),
                    project: m.project.and_then(DisplayReferenceWire::label),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseWire {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    profile: Option<DisplayReferenceWire>,
}

impl TokenResponseWire {
    pub(crate) fn into_state(self, now: DateTime<Utc>) -> LoginState {
        LoginState {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| now + Duration::seconds(secs)),
            profile: self.profile.and_then(|p| p.reference),
        }
    }
}

// ============================================================================
// Persisted session
// ============================================================================

/// Tokens of an authenticated session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Reference to the signed-in profile, e.g. `Practitioner/123`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl LoginState {
    /// True if the access token is past its expiry. Tokens without an expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Persistent storage for session tokens.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClientResult<Option<LoginState>>;
    fn save(&self, state: &LoginState) -> ClientResult<()>;
    fn clear(&self) -> ClientResult<()>;
}

/// Process-local token store, for tests and one-shot commands.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    state: Mutex<Option<LoginState>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: LoginState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Option<LoginState>> {
        let guard = self
            .state
            .lock()
            .map_err(|_| ClientError::TokenStore("token store lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &LoginState) -> ClientResult<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| ClientError::TokenStore("token store lock poisoned".into()))?;
        *guard = Some(state.clone());
        Ok(())
    }

    fn clear(&self) -> ClientResult<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| ClientError::TokenStore("token store lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkce_matches_rfc7636_example() {
        // Appendix B of RFC 7636.
        let pkce = Pkce::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".into());
        assert_eq!(pkce.challenge, "E9Melhoa2OwvFr2MwktS2Mx-QbLb6Hq8_H-dL1ObR9k");
    }

    #[test]
    fn generated_verifiers_are_long_enough_and_distinct() {
        let a = Pkce::generate();
        let b = Pkce::generate();
        assert_eq!(a.verifier.len(), 43);
        assert_ne!(a.verifier, b.verifier);
    }

    #[test]
    fn login_response_prefers_membership_display() {
        let wire: LoginResponseWire = serde_json::from_value(serde_json::json!({
            "login": "l1",
            "memberships": [{
                "id": "m1",
                "profile": {"reference": "Practitioner/1", "display": "Alice Smith"},
                "project": {"reference": "Project/9"}
            }]
        }))
        .expect("login response");
        let response = LoginResponse::from(wire);
        assert_eq!(response.code, None);
        assert_eq!(response.memberships[0].profile.as_deref(), Some("Alice Smith"));
        assert_eq!(response.memberships[0].project.as_deref(), Some("Project/9"));
    }

    #[test]
    fn token_expiry_is_computed_from_expires_in() {
        let now = Utc::now();
        let wire: TokenResponseWire = serde_json::from_value(serde_json::json!({
            "access_token": "a", "refresh_token": "r", "expires_in": 3600,
            "profile": {"reference": "Practitioner/1"}
        }))
        .expect("token response");
        let state = wire.into_state(now);
        assert_eq!(state.profile.as_deref(), Some("Practitioner/1"));
        assert!(!state.is_expired(now));
        assert!(state.is_expired(now + Duration::seconds(3600)));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().unwrap(), None);
        let state = LoginState {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: None,
            profile: None,
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), Some(state));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
