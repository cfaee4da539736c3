//! # medview core
//!
//! Screen logic for the medview patient-record viewer.
//!
//! This crate holds everything between the remote client and a front end:
//! - the navigation gate and login flow ([`session`])
//! - the paged, name-filtered patient list ([`list`]) and its search debouncer
//!   ([`debounce`])
//! - the patient detail screen with reports joined to their observations ([`detail`])
//! - preferences and session tokens persisted in a key-value store ([`store`],
//!   [`preferences`])
//! - text rendering in the selected language and theme ([`render`], [`i18n`])
//!
//! Screens talk to the server only through the `medview-client` traits. Every load is
//! tagged with a generation [`Ticket`], and a response is applied only while its ticket
//! is the latest one the screen issued.
//!
//! **No I/O loops**: reading input and driving the screens belongs to the binaries.

pub mod app;
pub mod config;
pub mod constants;
pub mod dates;
pub mod debounce;
pub mod detail;
pub mod error;
pub mod generation;
pub mod i18n;
pub mod list;
pub mod preferences;
pub mod range;
pub mod render;
pub mod session;
pub mod store;
pub mod watch;

#[cfg(test)]
pub(crate) mod testing;

pub use app::AppState;
pub use config::ViewerConfig;
pub use debounce::{run_debouncer, Debouncer};
pub use detail::{join_reports, DetailData, PatientDetail, ReportWithObservations};
pub use error::{CoreError, CoreResult};
pub use generation::{Generation, Ticket};
pub use list::{PatientList, PatientRow};
pub use preferences::{Language, Preferences, Theme};
pub use range::RangeIndicator;
pub use render::Renderer;
pub use session::{route, LoginFailure, LoginField, Route, Tab};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoredTokens};
pub use watch::NotificationWatcher;
