//! Integration tests for TaskFlow
//!
//! These tests drive the full application root over the in-memory backend:
//! - Registration, sign-in and route resolution
//! - Project, task and todo workflows with write-then-reload
//! - Dashboard pane building and the project page

use std::sync::Arc;
use std::time::Duration;
use taskflow::app::{self, AppState};
use taskflow::backend::{Backend, InMemoryBackend, Priority, Table};
use taskflow::error::AppError;
use taskflow::services::{AuthStatus, ClientSettings};
use taskflow::views::{
    resolve, Dashboard, Navigation, PaneLayout, ProjectForm, RegistrationForm, RegistrationView,
    Route, TaskForm,
};
use tempfile::TempDir;

/// Helper to create an application over a fresh in-memory backend
async fn create_test_app() -> (AppState, Arc<InMemoryBackend>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let backend = Arc::new(InMemoryBackend::new());

    let state = app::setup_with_backend(
        temp_dir.path().to_path_buf(),
        ClientSettings::default(),
        backend.clone(),
    )
    .await
    .unwrap();

    (state, backend, temp_dir)
}

async fn register_and_sign_in(state: &AppState) {
    let view = RegistrationForm {
        email: "ann@example.com".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
    }
    .submit(&state.auth)
    .await
    .unwrap();

    assert_eq!(view, RegistrationView::Navigate(Route::Dashboard));
}

async fn create_project(state: &AppState, name: &str) -> String {
    ProjectForm {
        name: name.to_string(),
        description: String::new(),
    }
    .submit(&state.store, &state.auth)
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn test_routes_follow_session() {
    let (state, _backend, _temp) = create_test_app().await;

    let status = state.auth.status().await;
    assert_eq!(status, AuthStatus::Anonymous);
    assert_eq!(resolve("/", &status), Navigation::Redirect(Route::Login));

    register_and_sign_in(&state).await;

    let status = state.auth.status().await;
    assert!(matches!(status, AuthStatus::Authenticated(_)));
    assert_eq!(resolve("/login", &status), Navigation::Redirect(Route::Dashboard));
    assert_eq!(resolve("/", &status), Navigation::Render(Route::Dashboard));

    state.auth.sign_out().await.unwrap();
    let status = state.auth.status().await;
    assert_eq!(resolve("/projects/x", &status), Navigation::Redirect(Route::Login));
}

#[tokio::test]
async fn test_confirmation_signup_stays_on_register() {
    let (state, backend, _temp) = create_test_app().await;
    backend.set_require_email_confirmation(true).await;

    let view = RegistrationForm {
        email: "new@example.com".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
    }
    .submit(&state.auth)
    .await
    .unwrap();

    assert!(matches!(view, RegistrationView::ShowMessage(ref m) if !m.is_empty()));
    let status = state.auth.status().await;
    assert_eq!(resolve("/register", &status), Navigation::Render(Route::Register));
}

#[tokio::test]
async fn test_project_task_todo_workflow() {
    let (state, _backend, _temp) = create_test_app().await;
    register_and_sign_in(&state).await;

    let project_id = create_project(&state, "Website").await;
    assert_eq!(state.store.projects().await.len(), 1);

    let task = TaskForm {
        title: "Landing page".to_string(),
        ..TaskForm::default()
    }
    .submit(&state.store, &state.auth, &project_id)
    .await
    .unwrap();

    assert!(!task.completed);
    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(state.store.tasks_for(&project_id).await.len(), 1);

    state.store.toggle_task_complete(&task.id).await.unwrap();
    state.store.toggle_task_complete(&task.id).await.unwrap();
    let tasks = state.store.fetch_tasks(&project_id).await.unwrap();
    assert!(tasks[0].completed);

    let a = state.store.add_todo(&task.id, "Hero", None).await.unwrap();
    let b = state.store.add_todo(&task.id, "Footer", None).await.unwrap();
    let c = state
        .store
        .add_todo(&task.id, "Copy", Some(Priority::High))
        .await
        .unwrap();
    assert_eq!(
        (a.order_index, b.order_index, c.order_index),
        (0, 1, 2)
    );

    state.store.update_todo_order(&a.id, 10).await.unwrap();
    state.store.toggle_todo(&b.id).await.unwrap();

    let todos = state.store.todos_for(&task.id).await;
    let order: Vec<&str> = todos.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(order, vec!["Footer", "Copy", "Hero"]);
    assert!(todos[0].completed);
}

#[tokio::test]
async fn test_dashboard_panes_and_layout() {
    let (state, _backend, _temp) = create_test_app().await;
    register_and_sign_in(&state).await;

    let first = create_project(&state, "One").await;
    let mut dashboard = Dashboard::new();

    let panes = state.load_dashboard(&mut dashboard).await.unwrap();
    assert_eq!(panes.len(), 1);
    assert_eq!(dashboard.layout(), PaneLayout::Single);

    let second = create_project(&state, "Two").await;
    TaskForm {
        title: "Today".to_string(),
        ..TaskForm::default()
    }
    .submit(&state.store, &state.auth, &first)
    .await
    .unwrap();

    let panes = state.load_dashboard(&mut dashboard).await.unwrap();
    assert_eq!(dashboard.layout(), PaneLayout::Split);
    assert_eq!(panes[0].pane.project_id, first);
    assert_eq!(panes[1].pane.project_id, second);

    // Each pane keeps its own tasks even though the store cache is global
    assert_eq!(panes[0].summary.total, 1);
    assert_eq!(panes[0].summary.today, 1);
    assert_eq!(panes[0].grouped.today.len(), 1);
    assert_eq!(panes[1].summary.total, 0);

    let third = create_project(&state, "Three").await;
    state.load_dashboard(&mut dashboard).await.unwrap();
    assert_eq!(dashboard.layout(), PaneLayout::Grid);

    // Manual order survives a reload
    assert!(dashboard.move_pane(2, 0));
    state.load_dashboard(&mut dashboard).await.unwrap();
    let order: Vec<&str> = dashboard
        .panes()
        .iter()
        .map(|p| p.project_id.as_str())
        .collect();
    assert_eq!(order, vec![third.as_str(), first.as_str(), second.as_str()]);
}

#[tokio::test]
async fn test_profile_failure_rolls_back_session() {
    let (state, backend, _temp) = create_test_app().await;
    backend.fail_table(Table::Profiles).await;

    let result = RegistrationForm {
        email: "ann@example.com".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
    }
    .submit(&state.auth)
    .await;

    assert!(matches!(result, Err(AppError::Backend(_))));

    // Let the session listener drain the sign-in and sign-out notifications
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(backend.get_session().await.unwrap().is_none());
    assert!(state.auth.user().await.is_none());
}

#[tokio::test]
async fn test_fetch_failure_surfaces_and_clears_loading() {
    let (state, backend, _temp) = create_test_app().await;
    register_and_sign_in(&state).await;
    create_project(&state, "Kept").await;

    backend.fail_table(Table::Projects).await;
    let mut dashboard = Dashboard::new();
    assert!(state.load_dashboard(&mut dashboard).await.is_err());

    assert!(!state.store.is_loading());
    assert_eq!(state.store.projects().await.len(), 1);
}

#[tokio::test]
async fn test_project_page_lists_its_tasks() {
    let (state, backend, temp_dir) = create_test_app().await;
    register_and_sign_in(&state).await;

    let launch = create_project(&state, "Launch").await;
    let hiring = create_project(&state, "Hiring").await;
    for (project_id, title) in [(&launch, "Press kit"), (&hiring, "Post job"), (&launch, "Demo")] {
        TaskForm {
            title: title.to_string(),
            ..TaskForm::default()
        }
        .submit(&state.store, &state.auth, project_id)
        .await
        .unwrap();
    }

    let path = format!("/projects/{}", launch);
    let status = state.auth.status().await;
    assert_eq!(
        resolve(&path, &status),
        Navigation::Render(Route::Project(launch.clone()))
    );

    let view = state.load_project(&launch).await.unwrap();
    assert_eq!(view.project.name, "Launch");
    let titles: Vec<&str> = view.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Demo", "Press kit"]);
    assert_eq!(view.summary.total, 2);
    assert_eq!(view.grouped.today.len(), 2);

    // A fresh root with an empty cache fetches the project list first
    let reopened = app::setup_with_backend(
        temp_dir.path().to_path_buf(),
        ClientSettings::default(),
        backend.clone(),
    )
    .await
    .unwrap();
    let view = reopened.load_project(&hiring).await.unwrap();
    assert_eq!(view.project.name, "Hiring");
    assert_eq!(view.tasks.len(), 1);
    assert!(!reopened.store.is_loading());

    let missing = reopened.load_project("no-such-project").await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    reopened.auth.unmount();
    state.auth.unmount();
}
