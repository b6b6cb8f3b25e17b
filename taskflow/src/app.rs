//! Application state and initialization
//!
//! This module owns the application root. The backend client, the domain
//! store and the auth context are created here once and handed to the
//! view layer through `AppState`.

use crate::backend::{Backend, HttpBackend, InMemoryBackend, Project, SessionStore, Task};
use crate::error::{AppError, Result};
use crate::services::{AuthContext, ClientSettings, DomainStore, SettingsService};
use crate::views::grouping::{self, GroupedTasks, PaneSummary};
use crate::views::{Dashboard, Pane};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings: ClientSettings,
    pub settings_service: SettingsService,
    pub store: DomainStore,
    pub auth: AuthContext,
}

/// Everything one dashboard pane shows
#[derive(Debug, Clone)]
pub struct PaneView {
    pub pane: Pane,
    pub tasks: Vec<Task>,
    pub grouped: GroupedTasks,
    pub summary: PaneSummary,
}

/// Everything the project page shows
#[derive(Debug, Clone)]
pub struct ProjectView {
    pub project: Project,
    pub tasks: Vec<Task>,
    pub grouped: GroupedTasks,
    pub summary: PaneSummary,
}

impl AppState {
    pub fn new(app_data_dir: PathBuf, settings: ClientSettings, backend: Arc<dyn Backend>) -> Self {
        let store = DomainStore::new(backend.clone());
        let auth = AuthContext::new(backend, settings.auth_redirect_url());

        Self {
            settings_service: SettingsService::new(app_data_dir.clone()),
            app_data_dir,
            settings,
            store,
            auth,
        }
    }

    /// Fetch projects and each project's tasks for the dashboard.
    ///
    /// `fetch_tasks` replaces the whole task cache, so each pane is built
    /// from the rows returned by its own fetch rather than from the cache.
    pub async fn load_dashboard(&self, dashboard: &mut Dashboard) -> Result<Vec<PaneView>> {
        let projects = self.store.fetch_projects().await?;
        dashboard.sync_projects(&projects);

        let today = grouping::today();
        let mut views = Vec::with_capacity(dashboard.panes().len());

        for pane in dashboard.panes() {
            let tasks = self.store.fetch_tasks(&pane.project_id).await?;
            views.push(PaneView {
                pane: pane.clone(),
                grouped: grouping::group_by_day(&tasks, today),
                summary: grouping::summarize(&tasks, today),
                tasks,
            });
        }

        Ok(views)
    }

    /// Fetch one project's tasks for its detail page. The project list is
    /// fetched first when the project is not cached yet.
    pub async fn load_project(&self, project_id: &str) -> Result<ProjectView> {
        let project = match self.store.project(project_id).await {
            Some(project) => project,
            None => self
                .store
                .fetch_projects()
                .await?
                .into_iter()
                .find(|p| p.id == project_id)
                .ok_or_else(|| AppError::NotFound(format!("Project {}", project_id)))?,
        };

        let tasks = self.store.fetch_tasks(project_id).await?;
        let today = grouping::today();

        Ok(ProjectView {
            project,
            grouped: grouping::group_by_day(&tasks, today),
            summary: grouping::summarize(&tasks, today),
            tasks,
        })
    }
}

/// Build the backend client the settings describe. The signed-in session
/// is kept in `app_data_dir`. Without a configured backend the app runs
/// against an in-memory backend.
pub fn create_backend(settings: &ClientSettings, app_data_dir: &Path) -> Result<Arc<dyn Backend>> {
    if settings.backend.is_configured() {
        let backend = HttpBackend::new(&settings.backend)?
            .with_session_store(SessionStore::new(app_data_dir.to_path_buf()));
        Ok(Arc::new(backend))
    } else {
        tracing::warn!("No backend configured, using in-memory backend");
        Ok(Arc::new(InMemoryBackend::new()))
    }
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: PathBuf, settings: ClientSettings) -> Result<AppState> {
    let backend = create_backend(&settings, &app_data_dir)?;
    setup_with_backend(app_data_dir, settings, backend).await
}

/// Setup against an explicit backend client
pub async fn setup_with_backend(
    app_data_dir: PathBuf,
    settings: ClientSettings,
    backend: Arc<dyn Backend>,
) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(&app_data_dir)?;

    let state = AppState::new(app_data_dir, settings, backend);
    state.auth.mount().await?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}
