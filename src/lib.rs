//! Clinic Desk core library
//!
//! Session handling, route guarding and clinical record intake for the clinic
//! administration client. Persistence, authentication and file storage are
//! delegated to the hosted backend behind [`backend::Backend`].

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod guard;
pub mod local_state;
pub mod models;
pub mod notify;
pub mod records;
pub mod routes;
pub mod services;
pub mod session;
pub mod telemetry;

pub use app::ClinicApp;
pub use error::{BackendError, ClinicError, Result};
pub use guard::{AuthTimeoutPolicy, GuardDecision, GuardVerdict, RouteGuard};
pub use session::SessionStore;
