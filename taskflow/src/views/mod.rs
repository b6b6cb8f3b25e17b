//! View layer
//!
//! Derived display state over the store and auth context: dashboard pane
//! layout, task grouping by day, route resolution and form submission.

pub mod forms;
pub mod grouping;
pub mod layout;
pub mod routes;

pub use forms::{LoginForm, ProjectForm, RegistrationForm, RegistrationView, TaskForm, TodoForm};
pub use grouping::{group_by_day, summarize, GroupedTasks, PaneSummary, TaskGroup};
pub use layout::{Dashboard, Pane, PaneLayout};
pub use routes::{resolve, Navigation, Route};
