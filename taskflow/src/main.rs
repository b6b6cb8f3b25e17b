// TaskFlow - project and task manager client
// Entry point: boots the application root and reports the dashboard

use anyhow::Context;
use std::path::PathBuf;
use taskflow::app;
use taskflow::services::{AuthStatus, ClientSettings, SettingsService};
use taskflow::views::{resolve, Dashboard, Navigation, Route};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn data_dir() -> PathBuf {
    std::env::var_os("TASKFLOW_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".taskflow"))
}

/// Environment variables take precedence over the settings file
fn apply_env_overrides(settings: &mut ClientSettings) {
    if let Ok(url) = std::env::var("TASKFLOW_BACKEND_URL") {
        settings.backend.url = url;
    }
    if let Ok(key) = std::env::var("TASKFLOW_ANON_KEY") {
        settings.backend.anon_key = key;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskflow=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TaskFlow");

    let data_dir = data_dir();
    let mut settings = SettingsService::new(data_dir.clone())
        .load()
        .await
        .context("failed to load settings")?;
    apply_env_overrides(&mut settings);

    let state = app::setup(data_dir, settings)
        .await
        .context("failed to initialize application")?;

    let preferences = state
        .settings_service
        .get_preferences()
        .await
        .context("failed to load preferences")?;
    tracing::debug!(
        "Preferences: dark mode {}, notifications {}",
        preferences.dark_mode,
        preferences.notifications
    );

    // Optional start path, e.g. `taskflow /projects/<id>`
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| Route::Dashboard.path());

    let status = state.auth.status().await;
    match resolve(&path, &status) {
        Navigation::Render(Route::Dashboard) => {
            let mut dashboard = Dashboard::new();
            let panes = state
                .load_dashboard(&mut dashboard)
                .await
                .context("failed to load dashboard")?;

            tracing::info!(
                "Dashboard: {} panes, {:?} layout",
                panes.len(),
                dashboard.layout()
            );
            for view in &panes {
                tracing::info!("{}: {}", view.pane.title, view.summary);
            }
        }
        Navigation::Render(Route::Project(project_id)) => {
            let view = state
                .load_project(&project_id)
                .await
                .context("failed to load project")?;

            tracing::info!("{}: {}", view.project.name, view.summary);
            for task in &view.tasks {
                tracing::info!(
                    "[{} {}] {}{}",
                    task.priority.as_str(),
                    task.priority.color(),
                    task.title,
                    if task.completed { " (done)" } else { "" }
                );
            }
        }
        Navigation::Render(route) => {
            tracing::info!("Nothing to load for {}", route);
        }
        Navigation::Redirect(route) => {
            tracing::info!("Redirecting {} to {}", path, route);
        }
        Navigation::Pending => {
            tracing::debug!("Session check still pending for {}", path);
        }
    }

    if let AuthStatus::Authenticated(user) = status {
        tracing::info!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id));
    }

    state.auth.unmount();
    Ok(())
}
