//! Services module
//!
//! Business logic services that sit between the view layer and the backend.

pub mod auth;
pub mod settings;
pub mod store;

pub use auth::{AuthContext, AuthStatus, SignUpOutcome};
pub use settings::{BackendSettings, ClientSettings, SettingsService};
pub use store::DomainStore;
