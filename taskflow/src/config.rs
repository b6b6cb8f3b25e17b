//! Application configuration constants
//!
//! Central location for collection names, validation boundaries and
//! dashboard layout parameters used throughout the application.

// ===== Backend Collections =====

pub const PROJECTS_TABLE: &str = "projects";
pub const TASKS_TABLE: &str = "tasks";
pub const TODO_ITEMS_TABLE: &str = "todo_items";
pub const PROFILES_TABLE: &str = "profiles";

/// Timeout applied to every HTTP request against the hosted backend
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// User agent sent with backend requests
pub const USER_AGENT: &str = concat!("TaskFlow/", env!("CARGO_PKG_VERSION"));

// ===== Authentication =====

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Path the OAuth provider and confirmation emails redirect back to
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback";

/// Shown when sign-up succeeded but the account still needs email confirmation
pub const CONFIRM_EMAIL_MESSAGE: &str = "Please check your email for confirmation link";

/// Default site origin used to build redirect URLs
pub const DEFAULT_SITE_URL: &str = "http://localhost:5173";

/// File in the app data directory holding the signed-in session
pub const SESSION_FILE: &str = "session.json";

/// Capacity of the session-change broadcast channel
pub const AUTH_EVENT_CAPACITY: usize = 16;

// ===== Dashboard Layout =====

/// CSS grid template for a single full-width pane
pub const SINGLE_TEMPLATE: &str = "1fr";

/// CSS grid template for two side-by-side panes
pub const SPLIT_TEMPLATE: &str = "1fr 1fr";

/// CSS grid template for three or more panes (auto-fit with minimum width)
pub const GRID_TEMPLATE: &str = "repeat(auto-fit, minmax(350px, 1fr))";
