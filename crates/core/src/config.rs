//! Viewer runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the screens
//! and the remote client. Nothing reads process-wide environment variables after that,
//! so tests can build a `ViewerConfig` directly.

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORAGE_FILE,
    MAX_PAGE_SIZE,
};
use crate::{CoreError, CoreResult};
use medview_client::ClientOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Viewer configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    base_url: String,
    client_id: String,
    storage_path: PathBuf,
    page_size: u32,
    request_timeout: Duration,
}

impl ViewerConfig {
    /// Create a new `ViewerConfig`.
    ///
    /// The base URL is normalised to end with `/`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if the base URL is not http(s), the page size
    /// is outside `1..=1000`, or the timeout is zero.
    pub fn new(
        base_url: &str,
        client_id: String,
        storage_path: PathBuf,
        page_size: u32,
        request_timeout: Duration,
    ) -> CoreResult<Self> {
        let base_url = normalise_base_url(base_url)?;

        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(CoreError::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        if request_timeout.is_zero() {
            return Err(CoreError::InvalidInput(
                "request timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            base_url,
            client_id: client_id.trim().to_owned(),
            storage_path,
            page_size,
            request_timeout,
        })
    }

    /// Resolve configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Binaries pass `|k| std::env::var(k).ok()`; tests pass a closure over a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let base_url = value("MEDPLUM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let client_id = value("MEDPLUM_CLIENT_ID").unwrap_or_default();
        let storage_path = value("MEDVIEW_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_FILE));
        let page_size = page_size_from_env_value(value("MEDVIEW_PAGE_SIZE"))?;
        let request_timeout = timeout_from_env_value(value("MEDVIEW_REQUEST_TIMEOUT_SECS"))?;

        Self::new(
            &base_url,
            client_id,
            storage_path,
            page_size,
            request_timeout,
        )
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Options for the remote client.
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::new(self.base_url.clone(), self.client_id.clone());
        options.timeout = self.request_timeout;
        options
    }
}

fn normalise_base_url(raw: &str) -> CoreResult<String> {
    let mut url = raw.trim().to_owned();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CoreError::InvalidInput(format!(
            "MEDPLUM_BASE_URL must be an http(s) URL, got {raw:?}"
        )));
    }
    if !url.ends_with('/') {
        url.push('/');
    }
    Ok(url)
}

/// Parse the page size from an optional string value.
///
/// If `value` is `None`, returns the default page size.
pub fn page_size_from_env_value(value: Option<String>) -> CoreResult<u32> {
    match value {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(v) => v.parse::<u32>().map_err(|_| {
            CoreError::InvalidInput(format!("MEDVIEW_PAGE_SIZE must be a number, got {v:?}"))
        }),
    }
}

/// Parse the request timeout (whole seconds) from an optional string value.
pub fn timeout_from_env_value(value: Option<String>) -> CoreResult<Duration> {
    match value {
        None => Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        Some(v) => v.parse::<u64>().map(Duration::from_secs).map_err(|_| {
            CoreError::InvalidInput(format!(
                "MEDVIEW_REQUEST_TIMEOUT_SECS must be a number of seconds, got {v:?}"
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_environment_is_empty() {
        let cfg = ViewerConfig::from_lookup(lookup(&[])).expect("defaults should be valid");
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.client_id(), "");
        assert_eq!(cfg.storage_path(), Path::new(DEFAULT_STORAGE_FILE));
        assert_eq!(cfg.page_size(), 10);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("MEDPLUM_BASE_URL", "https://api.example.org"),
            ("MEDPLUM_CLIENT_ID", " abc "),
            ("MEDVIEW_PAGE_SIZE", "20"),
        ]))
        .expect("config should be valid");
        assert_eq!(cfg.base_url(), "https://api.example.org/");
        assert_eq!(cfg.client_id(), "abc");
        assert_eq!(cfg.page_size(), 20);

        let options = cfg.client_options();
        assert_eq!(options.base_url, "https://api.example.org/");
        assert_eq!(options.client_id, "abc");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let cfg = ViewerConfig::from_lookup(lookup(&[
            ("MEDPLUM_BASE_URL", "  "),
            ("MEDVIEW_PAGE_SIZE", ""),
        ]))
        .expect("blank values should be ignored");
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_rejects_invalid_values() {
        for pairs in [
            [("MEDPLUM_BASE_URL", "localhost:8103")],
            [("MEDVIEW_PAGE_SIZE", "0")],
            [("MEDVIEW_PAGE_SIZE", "1001")],
            [("MEDVIEW_PAGE_SIZE", "ten")],
            [("MEDVIEW_REQUEST_TIMEOUT_SECS", "0")],
            [("MEDVIEW_REQUEST_TIMEOUT_SECS", "-1")],
        ] {
            let err = ViewerConfig::from_lookup(lookup(&pairs)).expect_err("should be rejected");
            assert!(
                matches!(err, CoreError::InvalidInput(_)),
                "unexpected error for {pairs:?}: {err}"
            );
        }
    }
}
