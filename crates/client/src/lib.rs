//! # medview client
//!
//! Typed client for a Medplum-compatible FHIR R4 server.
//!
//! This crate covers the remote surface medview uses and nothing more:
//! - resource reads and searches ([`ResourceClient`])
//! - password login with PKCE, profile selection, code exchange and sign-out
//!   ([`AuthClient`])
//! - websocket subscriptions ([`subscription`])
//!
//! Responses are decoded into `fhir` domain types here, at the boundary. Screen
//! logic lives in `medview-core` and talks to the traits, so it can be exercised
//! against in-memory fakes.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod http;
pub mod search;
pub mod subscription;
pub mod traits;

pub use auth::{LoginResponse, LoginState, Membership, MemoryTokenStore, TokenStore};
pub use http::{ClientOptions, HealthStatus, HttpResourceClient};
pub use search::SearchParams;
pub use subscription::{SubscriptionEvent, SubscriptionHandle};
pub use traits::{AuthClient, ResourceClient};

/// Errors returned by the client crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid response: {0}")]
    Fhir(#[from] fhir::FhirError),

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("login failed: {0}")]
    Login(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl ClientError {
    /// HTTP status of a server error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Type alias for Results that can fail with a [`ClientError`].
pub type ClientResult<T> = Result<T, ClientError>;
