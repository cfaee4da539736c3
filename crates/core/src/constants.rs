//! Constants used throughout the medview core crate.
//!
//! Store keys, configuration defaults and the fixed strings shared by the screens.

use std::time::Duration;

/// Product name shown on the settings screen.
pub const APP_NAME: &str = "medview";

/// Store key: `"true"` until onboarding has been completed.
pub const IS_FIRST_TIME_KEY: &str = "is_first_time";

/// Store key for the selected UI language code.
pub const LANGUAGE_KEY: &str = "language";

/// Store key for the selected colour theme.
pub const THEME_KEY: &str = "theme";

/// Store key for the persisted session tokens (JSON text).
pub const ACTIVE_LOGIN_KEY: &str = "activeLogin";

/// Server root used when `MEDPLUM_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8103/";

/// Store file used when `MEDVIEW_STORAGE_PATH` is not set.
pub const DEFAULT_STORAGE_FILE: &str = "medview.yaml";

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Quiet period before typed search text is committed.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Placeholder for any missing value on the detail screen.
pub const NOT_AVAILABLE: &str = "N/A";
