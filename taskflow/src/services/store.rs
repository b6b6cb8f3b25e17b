//! Domain store
//!
//! Holds the cached copies of projects, tasks and todo items and exposes
//! the fetch/create/mutate operations against the backend.
//!
//! Every mutation follows a write-then-reload contract: the write is sent
//! first and the affected collection is fetched again afterwards. Nothing
//! is updated optimistically, so there is never anything to roll back.

use crate::backend::{
    decode_row, decode_rows, Backend, CreateTaskParams, Direction, NewProject, NewTask, NewTodo,
    Priority, Project, Query, Table, Task, TodoItem,
};
use crate::error::{AppError, Result};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Cached collections
#[derive(Debug, Default)]
struct StoreState {
    projects: Vec<Project>,
    tasks: Vec<Task>,
    todos: Vec<TodoItem>,
}

/// Counts one in-flight fetch for its lifetime.
/// Dropping the guard releases it, including when the owning future is cancelled.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn start(in_flight: &'a AtomicUsize) -> Self {
        in_flight.fetch_add(1, Ordering::SeqCst);
        Self(in_flight)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

fn require_text(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

/// Data-access service owned by the application root and shared by clone
#[derive(Clone)]
pub struct DomainStore {
    backend: Arc<dyn Backend>,
    state: Arc<RwLock<StoreState>>,
    loading: Arc<AtomicUsize>,
    // Serializes read-max-then-insert so this process never races itself.
    // Other clients writing the same task can still collide.
    todo_writes: Arc<Mutex<()>>,
}

impl DomainStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(StoreState::default())),
            loading: Arc::new(AtomicUsize::new(0)),
            todo_writes: Arc::new(Mutex::new(())),
        }
    }

    // ===== Snapshots =====

    /// True while any project or task fetch is in flight
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    pub async fn projects(&self) -> Vec<Project> {
        self.state.read().await.projects.clone()
    }

    pub async fn project(&self, project_id: &str) -> Option<Project> {
        self.state
            .read()
            .await
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    /// Cached tasks belonging to one project
    pub async fn tasks_for(&self, project_id: &str) -> Vec<Task> {
        self.state
            .read()
            .await
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    pub async fn todos(&self) -> Vec<TodoItem> {
        self.state.read().await.todos.clone()
    }

    /// Cached todos of one task in display order
    pub async fn todos_for(&self, task_id: &str) -> Vec<TodoItem> {
        let mut todos: Vec<TodoItem> = self
            .state
            .read()
            .await
            .todos
            .iter()
            .filter(|t| t.task_id == task_id)
            .cloned()
            .collect();
        todos.sort_by_key(|t| t.order_index);
        todos
    }

    // ===== Projects =====

    /// Replace the cached projects with all projects, newest first.
    /// On failure the cache is left unchanged.
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        let _loading = LoadingGuard::start(&self.loading);

        let query = Query::select(Table::Projects).order("created_at", Direction::Desc);
        let projects: Vec<Project> = match self.backend.select(query).await.and_then(decode_rows) {
            Ok(projects) => projects,
            Err(e) => {
                tracing::error!("Error fetching projects: {}", e);
                return Err(e);
            }
        };

        tracing::debug!("Fetched {} projects", projects.len());
        self.state.write().await.projects = projects.clone();

        Ok(projects)
    }

    /// Insert a project. The cached collection is not touched; callers
    /// re-fetch to see it.
    pub async fn create_project(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Option<&str>,
    ) -> Result<Project> {
        let owner_id = owner_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::Auth("User not authenticated".to_string()))?;
        require_text(name, "Project name is required")?;

        tracing::info!("Creating project: {}", name);

        let row = NewProject {
            name: name.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            owner_id: owner_id.to_string(),
        };

        let project: Project = decode_row(
            self.backend
                .insert(Table::Projects, serde_json::to_value(row)?)
                .await?,
        )?;

        tracing::info!("Project created successfully: {}", project.id);
        Ok(project)
    }

    // ===== Tasks =====

    /// Replace the whole cached task collection with the tasks of one
    /// project, newest first.
    pub async fn fetch_tasks(&self, project_id: &str) -> Result<Vec<Task>> {
        let _loading = LoadingGuard::start(&self.loading);

        let query = Query::select(Table::Tasks)
            .eq("project_id", project_id)
            .order("created_at", Direction::Desc);
        let tasks: Vec<Task> = match self.backend.select(query).await.and_then(decode_rows) {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::error!("Error fetching tasks for project {}: {}", project_id, e);
                return Err(e);
            }
        };

        tracing::debug!("Fetched {} tasks for project {}", tasks.len(), project_id);
        self.state.write().await.tasks = tasks.clone();

        Ok(tasks)
    }

    /// Insert a pending, incomplete task and reload the project's tasks
    pub async fn create_task(&self, params: CreateTaskParams) -> Result<Task> {
        require_text(&params.title, "Task title is required")?;
        if params.created_by.is_empty() {
            return Err(AppError::Auth("User not authenticated".to_string()));
        }

        tracing::info!("Creating task '{}' in project {}", params.title, params.project_id);

        let project_id = params.project_id.clone();
        let row = NewTask::from(params);
        let task: Task = decode_row(
            self.backend
                .insert(Table::Tasks, serde_json::to_value(row)?)
                .await?,
        )?;

        self.fetch_tasks(&project_id).await?;

        tracing::info!("Task created successfully: {}", task.id);
        Ok(task)
    }

    /// Mark a task completed. This never un-completes a task, and the
    /// cache is only refreshed by the next fetch.
    pub async fn toggle_task_complete(&self, task_id: &str) -> Result<()> {
        tracing::debug!("Completing task: {}", task_id);

        self.backend
            .update(Table::Tasks, task_id, json!({ "completed": true }))
            .await?;

        Ok(())
    }

    // ===== Todo items =====

    /// Replace the cached todos of one task, in order-index order.
    /// Cached todos of other tasks are kept.
    pub async fn fetch_todos(&self, task_id: &str) -> Result<Vec<TodoItem>> {
        let query = Query::select(Table::TodoItems)
            .eq("task_id", task_id)
            .order("order_index", Direction::Asc);
        let todos: Vec<TodoItem> = match self.backend.select(query).await.and_then(decode_rows) {
            Ok(todos) => todos,
            Err(e) => {
                tracing::error!("Error fetching todos for task {}: {}", task_id, e);
                return Err(e);
            }
        };

        tracing::debug!("Fetched {} todos for task {}", todos.len(), task_id);

        let mut state = self.state.write().await;
        state.todos.retain(|t| t.task_id != task_id);
        state.todos.extend(todos.iter().cloned());

        Ok(todos)
    }

    /// One past the highest order index of the task, or 0 for an empty task.
    ///
    /// This is a plain read; two clients adding to the same task at the
    /// same time can both observe the same maximum.
    pub async fn next_order_index(&self, task_id: &str) -> Result<i64> {
        let query = Query::select(Table::TodoItems)
            .eq("task_id", task_id)
            .order("order_index", Direction::Desc)
            .limit(1);

        let top: Vec<TodoItem> = decode_rows(self.backend.select(query).await?)?;
        Ok(top.first().map_or(0, |t| t.order_index + 1))
    }

    /// Append a todo to a task and reload the task's todos
    pub async fn add_todo(
        &self,
        task_id: &str,
        content: &str,
        priority: Option<Priority>,
    ) -> Result<TodoItem> {
        require_text(content, "Todo content is required")?;

        let todo: TodoItem = {
            let _write = self.todo_writes.lock().await;

            let order_index = self.next_order_index(task_id).await?;
            tracing::info!("Adding todo to task {} at index {}", task_id, order_index);

            let row = NewTodo {
                task_id: task_id.to_string(),
                content: content.trim().to_string(),
                priority: priority.unwrap_or_default(),
                order_index,
                completed: false,
            };

            decode_row(
                self.backend
                    .insert(Table::TodoItems, serde_json::to_value(row)?)
                    .await?,
            )?
        };

        self.fetch_todos(task_id).await?;
        Ok(todo)
    }

    /// Flip a todo's completion flag and reload its task's todos
    pub async fn toggle_todo(&self, todo_id: &str) -> Result<TodoItem> {
        let query = Query::select(Table::TodoItems).eq("id", todo_id).limit(1);
        let current: TodoItem = decode_rows(self.backend.select(query).await?)?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Todo {}", todo_id)))?;

        tracing::debug!("Toggling todo {} to {}", todo_id, !current.completed);

        let updated: TodoItem = decode_row(
            self.backend
                .update(
                    Table::TodoItems,
                    todo_id,
                    json!({ "completed": !current.completed }),
                )
                .await?,
        )?;

        self.fetch_todos(&updated.task_id).await?;
        Ok(updated)
    }

    /// Move a todo to a new order index and reload its task's todos
    pub async fn update_todo_order(&self, todo_id: &str, new_index: i64) -> Result<()> {
        tracing::debug!("Moving todo {} to index {}", todo_id, new_index);

        let updated: TodoItem = decode_row(
            self.backend
                .update(Table::TodoItems, todo_id, json!({ "order_index": new_index }))
                .await?,
        )?;

        self.fetch_todos(&updated.task_id).await?;
        Ok(())
    }
}
