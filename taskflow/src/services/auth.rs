//! Auth context
//!
//! Wraps the session state (current user, loading flag) and the
//! sign-in/sign-up/sign-out operations. While mounted it follows the
//! backend's session-change notifications.

use crate::backend::{AuthEvent, Backend, Credentials, OAuthProvider, Profile, Table, User};
use crate::config;
use crate::error::{AppError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// Where the session currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Initial session check still in flight
    Loading,
    Anonymous,
    Authenticated(User),
}

#[derive(Debug, Clone)]
struct AuthState {
    user: Option<User>,
    loading: bool,
}

/// Result of a sign-up. `message` is set when the account still has to be
/// confirmed by email; that is not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    pub user: Option<User>,
    pub message: Option<String>,
}

/// Session-change listener; aborted on unmount or when the last context clone drops
struct Listener(Mutex<Option<JoinHandle<()>>>);

impl Listener {
    fn replace(&self, handle: Option<JoinHandle<()>>) {
        if let Ok(mut guard) = self.0.lock() {
            if let Some(previous) = std::mem::replace(&mut *guard, handle) {
                previous.abort();
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.replace(None);
    }
}

#[derive(Clone)]
pub struct AuthContext {
    backend: Arc<dyn Backend>,
    state: Arc<RwLock<AuthState>>,
    redirect_url: String,
    listener: Arc<Listener>,
}

impl AuthContext {
    /// Create an unmounted context; it reports `Loading` until [`mount`](Self::mount)
    pub fn new(backend: Arc<dyn Backend>, redirect_url: impl Into<String>) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(AuthState {
                user: None,
                loading: true,
            })),
            redirect_url: redirect_url.into(),
            listener: Arc::new(Listener(Mutex::new(None))),
        }
    }

    /// Start following session changes and resolve the initial session
    pub async fn mount(&self) -> Result<()> {
        let events = self.backend.subscribe();
        self.listener
            .replace(Some(spawn_listener(events, self.state.clone())));

        let session = self.backend.get_session().await;

        let mut state = self.state.write().await;
        state.loading = false;

        match session {
            Ok(session) => {
                state.user = session.map(|s| s.user);
                tracing::info!(
                    "Initial session resolved: {}",
                    if state.user.is_some() { "authenticated" } else { "anonymous" }
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to get initial session: {}", e);
                state.user = None;
                Err(e)
            }
        }
    }

    /// Stop following session changes
    pub fn unmount(&self) {
        self.listener.replace(None);
        tracing::debug!("Auth context unmounted");
    }

    pub async fn status(&self) -> AuthStatus {
        let state = self.state.read().await;
        match (&state.user, state.loading) {
            (_, true) => AuthStatus::Loading,
            (Some(user), false) => AuthStatus::Authenticated(user.clone()),
            (None, false) => AuthStatus::Anonymous,
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    async fn set_user(&self, user: Option<User>) {
        self.state.write().await.user = user;
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let session = self
            .backend
            .sign_in_with_password(&Credentials::new(email.trim(), password))
            .await?;

        self.set_user(Some(session.user.clone())).await;
        Ok(session.user)
    }

    /// Begin the Google OAuth flow. Returns the URL to redirect to; the
    /// signed-in session arrives later as a session-change notification.
    pub async fn sign_in_with_google(&self) -> Result<String> {
        let url = self
            .backend
            .sign_in_with_oauth(OAuthProvider::Google, &self.redirect_url)
            .await?;

        tracing::info!("Redirecting to OAuth provider");
        Ok(url)
    }

    /// Create an account.
    ///
    /// When the provider requires email confirmation the outcome carries a
    /// message and no user. Otherwise a profile row is written; if that
    /// write fails the new session is signed out again and the profile error
    /// is returned. The auth account itself stays created.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let credentials = Credentials::new(email.trim(), password);
        let response = self
            .backend
            .sign_up(&credentials, &self.redirect_url)
            .await
            .map_err(|e| {
                tracing::error!("Signup process error: {}", e);
                e
            })?;

        let user = response
            .user
            .ok_or_else(|| AppError::Auth("No user data returned after signup".to_string()))?;

        if response.session.is_none() {
            tracing::info!("Signup for {} awaits email confirmation", user.id);
            return Ok(SignUpOutcome {
                user: None,
                message: Some(config::CONFIRM_EMAIL_MESSAGE.to_string()),
            });
        }

        let profile = serde_json::to_value(Profile::for_user(&user))?;
        if let Err(e) = self.backend.upsert(Table::Profiles, profile).await {
            tracing::error!("Profile creation error: {}", e);

            if let Err(sign_out_err) = self.backend.sign_out().await {
                tracing::warn!("Sign out after profile failure also failed: {}", sign_out_err);
            }
            self.set_user(None).await;

            let reason = match e {
                AppError::Backend(message) => message,
                other => other.to_string(),
            };
            return Err(AppError::Backend(format!("Failed to create profile: {}", reason)));
        }

        self.set_user(Some(user.clone())).await;
        tracing::info!("Signed up user {}", user.id);

        Ok(SignUpOutcome {
            user: Some(user),
            message: None,
        })
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.backend.sign_out().await?;
        self.set_user(None).await;
        Ok(())
    }
}

fn spawn_listener(
    mut events: broadcast::Receiver<AuthEvent>,
    state: Arc<RwLock<AuthState>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::debug!("Session change: {:?}", event.kind);
                    state.write().await.user = event.session.map(|s| s.user);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} session change notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
