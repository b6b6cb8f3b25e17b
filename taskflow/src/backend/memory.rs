//! In-memory backend
//!
//! Keeps every collection as a list of JSON rows in process memory.
//! Used for offline runs and as the backend in tests.

use super::models::*;
use super::query::{Direction, Query, Table};
use super::Backend;
use crate::config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

struct Account {
    password: String,
    user: User,
}

#[derive(Default)]
struct MemoryState {
    tables: HashMap<Table, Vec<Value>>,
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    last_created_at: Option<DateTime<Utc>>,
    require_email_confirmation: bool,
    failing_tables: HashSet<Table>,
    fail_sign_out: bool,
    request_count: usize,
    latency: HashMap<Table, std::time::Duration>,
}

impl MemoryState {
    /// Strictly increasing creation timestamp so ordering is deterministic
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_created_at {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_created_at = Some(now);
        now
    }

    fn check_table(&mut self, table: Table) -> Result<()> {
        self.request_count += 1;
        if self.failing_tables.contains(&table) {
            return Err(AppError::Backend(format!(
                "Simulated failure on table {}",
                table
            )));
        }
        Ok(())
    }

    fn new_session(user: User) -> Session {
        Session {
            access_token: Uuid::new_v4().to_string(),
            refresh_token: Some(Uuid::new_v4().to_string()),
            expires_in: Some(3600),
            user,
        }
    }
}

/// Backend keeping all data in process memory
pub struct InMemoryBackend {
    state: Mutex<MemoryState>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(config::AUTH_EVENT_CAPACITY);
        Self {
            state: Mutex::new(MemoryState::default()),
            events,
        }
    }

    /// When set, sign-up creates the account but returns no session
    pub async fn set_require_email_confirmation(&self, required: bool) {
        self.state.lock().await.require_email_confirmation = required;
    }

    /// Make every request against `table` fail
    pub async fn fail_table(&self, table: Table) {
        self.state.lock().await.failing_tables.insert(table);
    }

    pub async fn restore_table(&self, table: Table) {
        self.state.lock().await.failing_tables.remove(&table);
    }

    /// Delay every select against `table` by `delay`
    pub async fn set_latency(&self, table: Table, delay: std::time::Duration) {
        self.state.lock().await.latency.insert(table, delay);
    }

    pub async fn set_fail_sign_out(&self, fail: bool) {
        self.state.lock().await.fail_sign_out = fail;
    }

    /// Number of requests served so far
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.request_count
    }

    /// Snapshot of a collection's rows in insertion order
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.state
            .lock()
            .await
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Deliver a session change as if it came from the provider
    /// (OAuth completion, token refresh, sign-out elsewhere).
    pub async fn push_session_event(&self, event: AuthEvent) {
        {
            let mut state = self.state.lock().await;
            state.session = event.session.clone();
        }
        let _ = self.events.send(event);
    }

    /// Create an account directly, bypassing sign-up
    pub async fn register_user(&self, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.state.lock().await.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
            },
        );
        user
    }
}

fn matches_filter(row: &Value, column: &str, expected: &str) -> bool {
    match row.get(column) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => expected == "null",
        Some(other) => other.to_string() == expected,
    }
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn into_object(row: Value) -> Result<Map<String, Value>> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(AppError::Backend(format!(
            "Expected a JSON object row, got {}",
            other
        ))),
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn select(&self, query: Query) -> Result<Vec<Value>> {
        let delay = self.state.lock().await.latency.get(&query.table).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.check_table(query.table)?;

        let mut rows: Vec<Value> = state
            .tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| {
                        query
                            .filters
                            .iter()
                            .all(|(column, value)| matches_filter(row, column, value))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_column(a, b, &order.column);
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.check_table(table)?;

        let mut map = into_object(row)?;
        if !map.contains_key("id") {
            map.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        if !map.contains_key("created_at") {
            let created_at = state.next_created_at();
            map.insert(
                "created_at".to_string(),
                Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }

        let row = Value::Object(map);
        state.tables.entry(table).or_default().push(row.clone());

        Ok(row)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.check_table(table)?;

        let patch = into_object(patch)?;
        let row = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.iter_mut().find(|row| row_id(row) == Some(id)))
            .ok_or_else(|| AppError::NotFound(format!("{} row {}", table, id)))?;

        if let Value::Object(existing) = row {
            existing.extend(patch);
        }

        Ok(row.clone())
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value> {
        let id = row_id(&row).map(str::to_string);

        let exists = match &id {
            Some(id) => {
                let state = self.state.lock().await;
                state
                    .tables
                    .get(&table)
                    .is_some_and(|rows| rows.iter().any(|r| row_id(r) == Some(id.as_str())))
            }
            None => false,
        };

        match id {
            Some(id) if exists => self.update(table, &id, row).await,
            _ => self.insert(table, row).await,
        }
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        let mut state = self.state.lock().await;
        state.request_count += 1;
        Ok(state.session.clone())
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session> {
        let session = {
            let mut state = self.state.lock().await;
            state.request_count += 1;

            let user = match state.accounts.get(&credentials.email) {
                Some(account) if account.password == credentials.password => account.user.clone(),
                _ => return Err(AppError::Auth("Invalid login credentials".to_string())),
            };

            let session = MemoryState::new_session(user);
            state.session = Some(session.clone());
            session
        };

        let _ = self.events.send(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String> {
        self.state.lock().await.request_count += 1;
        Ok(format!(
            "memory://authorize?provider={}&redirect_to={}",
            provider.as_str(),
            redirect_to
        ))
    }

    async fn sign_up(&self, credentials: &Credentials, _redirect_to: &str) -> Result<SignUpResponse> {
        let response = {
            let mut state = self.state.lock().await;
            state.request_count += 1;

            if state.accounts.contains_key(&credentials.email) {
                return Err(AppError::Auth("User already registered".to_string()));
            }

            let user = User {
                id: Uuid::new_v4().to_string(),
                email: Some(credentials.email.clone()),
            };
            state.accounts.insert(
                credentials.email.clone(),
                Account {
                    password: credentials.password.clone(),
                    user: user.clone(),
                },
            );

            if state.require_email_confirmation {
                SignUpResponse {
                    user: Some(user),
                    session: None,
                }
            } else {
                let session = MemoryState::new_session(user.clone());
                state.session = Some(session.clone());
                SignUpResponse {
                    user: Some(user),
                    session: Some(session),
                }
            }
        };

        if let Some(session) = &response.session {
            let _ = self.events.send(AuthEvent::signed_in(session.clone()));
        }

        Ok(response)
    }

    async fn sign_out(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.request_count += 1;
            if state.fail_sign_out {
                return Err(AppError::Auth("Sign out request failed".to_string()));
            }
            state.session = None;
        }

        let _ = self.events.send(AuthEvent::signed_out());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
