//! Form submission
//!
//! Each form validates its input locally, then issues the matching store
//! or auth call. Validation failures never reach the network. Errors come
//! back as `AppError`; its display string is the banner text.

use super::routes::Route;
use crate::backend::{CreateTaskParams, Credentials, Priority, Project, Task, TodoItem};
use crate::config;
use crate::error::{AppError, Result};
use crate::services::auth::AuthContext;
use crate::services::store::DomainStore;
use chrono::{DateTime, Utc};

fn validate_email(email: &str) -> Result<()> {
    if !email.contains('@') || !email.contains('.') {
        return Err(AppError::Validation(
            "Please enter a valid email address".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }
        Ok(Credentials::new(self.email.trim(), self.password.as_str()))
    }

    /// Sign in and return where to navigate next
    pub async fn submit(&self, auth: &AuthContext) -> Result<Route> {
        let credentials = self.validate()?;
        auth.sign_in(&credentials.email, &credentials.password).await?;
        Ok(Route::Dashboard)
    }
}

/// Sign out from the navigation bar and return to the login page
pub async fn sign_out(auth: &AuthContext) -> Result<Route> {
    auth.sign_out().await?;
    Ok(Route::Login)
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// What the registration view does after a successful submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationView {
    /// Stay on the registration page and show this message
    ShowMessage(String),
    Navigate(Route),
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<Credentials> {
        let email = self.email.trim();
        validate_email(email)?;

        if self.password.chars().count() < config::MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters long",
                config::MIN_PASSWORD_LENGTH
            )));
        }

        if self.password != self.confirm_password {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        Ok(Credentials::new(email, self.password.as_str()))
    }

    pub async fn submit(&self, auth: &AuthContext) -> Result<RegistrationView> {
        let credentials = self.validate()?;
        let outcome = auth
            .sign_up(&credentials.email, &credentials.password)
            .await?;

        match (outcome.message, outcome.user) {
            (Some(message), _) => Ok(RegistrationView::ShowMessage(message)),
            (None, Some(_)) => Ok(RegistrationView::Navigate(Route::Dashboard)),
            (None, None) => Err(AppError::Generic("Failed to create account".to_string())),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
}

impl ProjectForm {
    /// Create the project for the signed-in user, then reload the project list
    pub async fn submit(&self, store: &DomainStore, auth: &AuthContext) -> Result<Project> {
        let owner = auth.user().await.map(|u| u.id);
        let description = Some(self.description.as_str()).filter(|d| !d.trim().is_empty());

        let project = store
            .create_project(&self.name, description, owner.as_deref())
            .await?;
        store.fetch_projects().await?;

        Ok(project)
    }
}

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Priority,
    pub reminders_enabled: bool,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            due_date: None,
            priority: Priority::Medium,
            reminders_enabled: true,
        }
    }
}

impl TaskForm {
    pub async fn submit(
        &self,
        store: &DomainStore,
        auth: &AuthContext,
        project_id: &str,
    ) -> Result<Task> {
        let user = auth
            .user()
            .await
            .ok_or_else(|| AppError::Auth("User not authenticated".to_string()))?;

        store
            .create_task(CreateTaskParams {
                project_id: project_id.to_string(),
                title: self.title.clone(),
                description: Some(self.description.clone()),
                due_date: self.due_date,
                priority: Some(self.priority),
                reminders_enabled: Some(self.reminders_enabled),
                created_by: user.id,
            })
            .await
    }
}

#[derive(Debug, Clone, Default)]
pub struct TodoForm {
    pub content: String,
    pub priority: Priority,
}

impl TodoForm {
    pub async fn submit(&self, store: &DomainStore, task_id: &str) -> Result<TodoItem> {
        store
            .add_todo(task_id, &self.content, Some(self.priority))
            .await
    }
}
