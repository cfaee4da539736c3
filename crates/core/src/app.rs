//! Application state shared by the front ends.

use crate::config::ViewerConfig;
use crate::preferences::{Language, Preferences, Theme};
use crate::render::Renderer;
use crate::session::{self, LoginFailure, Route};
use crate::store::{FileStore, KeyValueStore, StoredTokens};
use crate::CoreResult;
use medview_client::{AuthClient, HttpResourceClient, LoginState, ResourceClient};
use std::sync::Arc;

/// Everything a front end needs: configuration, persisted preferences and the
/// authenticated client.
///
/// Built once at startup and passed by reference; there are no globals.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ViewerConfig>,
    preferences: Preferences,
    client: HttpResourceClient,
}

impl AppState {
    /// Open the file store named by `config` and build the client on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store directory cannot be created or the client
    /// options are rejected.
    pub fn open(config: ViewerConfig) -> CoreResult<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.storage_path())?);
        Self::with_store(config, store)
    }

    /// Build on an existing store.
    pub fn with_store(config: ViewerConfig, store: Arc<dyn KeyValueStore>) -> CoreResult<Self> {
        let tokens = Arc::new(StoredTokens::new(store.clone()));
        let client = HttpResourceClient::new(config.client_options(), tokens)?;
        tracing::debug!(base_url = config.base_url(), "app state ready");
        Ok(Self {
            config: Arc::new(config),
            preferences: Preferences::new(store),
            client,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn client(&self) -> &HttpResourceClient {
        &self.client
    }

    pub fn resources(&self) -> &dyn ResourceClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    /// Where navigation starts given the stored first-run flag and session.
    pub fn current_route(&self) -> CoreResult<Route> {
        Ok(session::route(
            self.preferences.is_first_time()?,
            self.is_authenticated(),
        ))
    }

    /// Clear the first-run flag; navigation continues at login.
    pub fn complete_onboarding(&self) -> CoreResult<Route> {
        self.preferences.complete_onboarding()?;
        self.current_route()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<LoginState, LoginFailure> {
        session::sign_in(&self.client, email, password).await
    }

    /// Revoke the session on the server, then forget it locally whatever the server
    /// answered.
    pub async fn sign_out(&self) -> CoreResult<()> {
        Ok(self.client.sign_out().await?)
    }

    pub fn set_language(&self, language: Language) -> CoreResult<()> {
        self.preferences.set_language(language)
    }

    pub fn set_theme(&self, theme: Theme) -> CoreResult<()> {
        self.preferences.set_theme(theme)
    }

    /// Renderer for the stored language and theme.
    pub fn renderer(&self, colour: bool) -> CoreResult<Renderer> {
        Ok(Renderer::new(
            self.preferences.language()?,
            self.preferences.theme()?,
            colour,
        ))
    }
}
