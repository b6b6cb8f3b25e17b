//! Backend client module
//!
//! This module provides the seam to the hosted backend:
//! - Row models and insert payloads
//! - Query description for row-level selects
//! - The `Backend` trait and its REST and in-memory implementations
//! - On-disk persistence of the signed-in session

pub mod memory;
pub mod models;
pub mod query;
pub mod rest;
pub mod session_store;

pub use memory::InMemoryBackend;
pub use models::*;
pub use query::{Direction, Query, Table};
pub use rest::HttpBackend;
pub use session_store::SessionStore;

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::broadcast;

/// Request/response operations offered by the hosted backend.
///
/// Rows travel as JSON values; typed decoding happens in the callers
/// through [`decode_rows`] and [`decode_row`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Select rows matching the query
    async fn select(&self, query: Query) -> Result<Vec<Value>>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Merge `patch` into the row with the given id
    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value>;

    /// Insert or merge a row keyed on `id`
    async fn upsert(&self, table: Table, row: Value) -> Result<Value>;

    /// Current session, if any
    async fn get_session(&self) -> Result<Option<Session>>;

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session>;

    /// Start an OAuth flow; returns the URL the user must be sent to.
    /// Completion arrives later as a session-change event.
    async fn sign_in_with_oauth(&self, provider: OAuthProvider, redirect_to: &str)
        -> Result<String>;

    async fn sign_up(&self, credentials: &Credentials, redirect_to: &str)
        -> Result<SignUpResponse>;

    async fn sign_out(&self) -> Result<()>;

    /// Subscribe to session-change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Decode a list of rows into typed models
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(AppError::from))
        .collect()
}

/// Decode a single row into a typed model
pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T> {
    Ok(serde_json::from_value(row)?)
}
