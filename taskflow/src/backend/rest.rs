//! REST backend client
//!
//! Talks to a hosted backend exposing PostgREST-style row endpoints
//! under `/rest/v1` and GoTrue-style auth endpoints under `/auth/v1`.
//! The current session is kept in memory and, when a [`SessionStore`] is
//! attached, on disk; every sign-in or sign-out is broadcast to subscribers.

use super::models::*;
use super::query::{Query, Table};
use super::session_store::SessionStore;
use super::Backend;
use crate::config;
use crate::error::{AppError, Result};
use crate::services::settings::BackendSettings;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Backend client over HTTP
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<Session>>,
    session_store: Option<SessionStore>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackend {
    pub fn new(settings: &BackendSettings) -> Result<Self> {
        let base_url = settings.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(AppError::Generic(
                "Backend URL is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .user_agent(config::USER_AGENT)
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;

        let (events, _) = broadcast::channel(config::AUTH_EVENT_CAPACITY);

        tracing::info!("Backend client configured for {}", base_url);

        Ok(Self {
            client,
            base_url,
            anon_key: settings.anon_key.clone(),
            session: RwLock::new(None),
            session_store: None,
            events,
        })
    }

    /// Persist the session through `store` and restore it from there
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    fn rest_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{}", self.base_url, table.as_str())
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Build a request carrying the api key and the best available bearer token
    async fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.anon_key.clone(),
        };

        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
    }

    async fn set_session(&self, session: Option<Session>) {
        *self.session.write().await = session.clone();

        if let Some(store) = &self.session_store {
            let persisted = match &session {
                Some(session) => store.save(session).await,
                None => store.clear().await,
            };
            if let Err(e) = persisted {
                tracing::warn!("Failed to persist session: {}", e);
            }
        }

        let event = match session {
            Some(session) => AuthEvent::signed_in(session),
            None => AuthEvent::signed_out(),
        };
        let _ = self.events.send(event);
    }

    async fn send_rows(&self, builder: RequestBuilder, table: Table) -> Result<Vec<Value>> {
        let response = builder.send().await?;
        let response = check_status(response, AppError::Backend).await?;

        let rows: Vec<Value> = response.json().await?;
        tracing::debug!("{} returned {} rows", table, rows.len());

        Ok(rows)
    }
}

/// Pull a human-readable message out of an error body
pub(crate) fn error_message(body: &Value) -> Option<String> {
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

async fn check_status(response: Response, kind: fn(String) -> AppError) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|body| error_message(&body))
        .unwrap_or_else(|| format!("request failed with status {}", status));

    tracing::warn!("Backend returned {}: {}", status, message);
    Err(kind(message))
}

/// Interpret a sign-up body: a session when confirmation is not required,
/// otherwise a bare user object.
pub(crate) fn parse_sign_up(body: Value) -> Result<SignUpResponse> {
    if body.get("access_token").is_some() {
        let session: Session = serde_json::from_value(body)?;
        return Ok(SignUpResponse {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    let nested = body.get("user").filter(|user| !user.is_null()).cloned();
    let user: Option<User> = match nested {
        Some(user) => Some(serde_json::from_value(user)?),
        None if body.get("id").is_some() => Some(serde_json::from_value(body)?),
        None => None,
    };

    Ok(SignUpResponse {
        user,
        session: None,
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn select(&self, query: Query) -> Result<Vec<Value>> {
        let url = self.rest_url(query.table);
        let builder = self
            .request(Method::GET, &url)
            .await
            .query(&query.to_params());

        self.send_rows(builder, query.table).await
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        let url = self.rest_url(table);
        let builder = self
            .request(Method::POST, &url)
            .await
            .header("Prefer", "return=representation")
            .json(&row);

        self.send_rows(builder, table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<Value> {
        let url = self.rest_url(table);
        let builder = self
            .request(Method::PATCH, &url)
            .await
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&patch);

        self.send_rows(builder, table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} row {}", table, id)))
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<Value> {
        let url = self.rest_url(table);
        let builder = self
            .request(Method::POST, &url)
            .await
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&row);

        self.send_rows(builder, table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Backend(format!("Upsert into {} returned no rows", table)))
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        if let Some(session) = self.session.read().await.clone() {
            return Ok(Some(session));
        }

        let Some(store) = &self.session_store else {
            return Ok(None);
        };

        let restored = store.load().await?;
        if let Some(session) = &restored {
            tracing::info!("Restored session for {}", session.user.id);
            *self.session.write().await = Some(session.clone());
        }

        Ok(restored)
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.auth_url("token");
        let response = self
            .request(Method::POST, &url)
            .await
            .query(&[("grant_type", "password")])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await?;

        let session: Session = check_status(response, AppError::Auth).await?.json().await?;
        tracing::info!("Signed in as {}", session.user.id);

        self.set_session(Some(session.clone())).await;
        Ok(session)
    }

    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &str,
    ) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_url("authorize"),
            &[("provider", provider.as_str()), ("redirect_to", redirect_to)],
        )
        .map_err(|e| AppError::Auth(format!("Invalid authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    async fn sign_up(&self, credentials: &Credentials, redirect_to: &str) -> Result<SignUpResponse> {
        let url = self.auth_url("signup");
        let response = self
            .request(Method::POST, &url)
            .await
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
                "data": { "full_name": null, "avatar_url": null },
            }))
            .send()
            .await?;

        let body: Value = check_status(response, AppError::Auth).await?.json().await?;
        let parsed = parse_sign_up(body)?;

        if let Some(session) = &parsed.session {
            self.set_session(Some(session.clone())).await;
        }

        Ok(parsed)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.get_session().await?.is_none() {
            self.set_session(None).await;
            return Ok(());
        }

        let url = self.auth_url("logout");
        let response = self.request(Method::POST, &url).await.send().await?;
        check_status(response, AppError::Auth).await?;

        self.set_session(None).await;
        tracing::info!("Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
