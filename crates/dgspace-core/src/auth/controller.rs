//! The auth state controller: the single owner of the in-memory session.
//!
//! One `AuthController` is constructed at startup and handed (cloned) to
//! whatever needs session state. There is no global accessor; a component
//! can only observe or change the session through a controller it was given.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, SessionHooks};
use crate::routing::{Navigator, Route};
use crate::storage::{SessionStore, StoredSession};

use super::{AuthStatus, Identity, Profile, Session};

/// Shown for every login failure that has no backend message.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please try again.";

#[derive(Error, Debug)]
pub enum LoginError {
    /// The backend refused the credentials and said why.
    #[error("{0}")]
    Rejected(String),

    #[error("{}", LOGIN_FALLBACK_MESSAGE)]
    Transport(#[source] ApiError),

    #[error("{}", LOGIN_FALLBACK_MESSAGE)]
    InvalidResponse(String),

    #[error("{}", LOGIN_FALLBACK_MESSAGE)]
    Storage(String),

    #[error("Login already in progress")]
    Pending,
}

impl From<ApiError> for LoginError {
    fn from(err: ApiError) -> Self {
        match err.message() {
            Some(message) => LoginError::Rejected(message.to_string()),
            None => LoginError::Transport(err),
        }
    }
}

/// State shared between the controller and the HTTP gateway.
struct SharedState {
    store: SessionStore,
    navigator: Navigator,
    session: watch::Sender<Session>,
    initialized: AtomicBool,
    login_pending: AtomicBool,
}

impl SharedState {
    /// Drop the session from storage and memory. Safe to call repeatedly.
    fn end_session(&self, reason: &str) {
        if let Err(e) = self.store.clear() {
            error!(error = %e, reason, "Failed to clear persisted session");
        }
        let changed = self.session.send_if_modified(|session| {
            if session.is_authenticated() {
                session.set_identity(None);
                true
            } else {
                false
            }
        });
        if changed {
            info!(reason, "Signed out");
        } else {
            debug!(reason, "Sign-out with no active session");
        }
    }
}

impl SessionHooks for SharedState {
    fn credential(&self) -> Option<String> {
        self.store.credential()
    }

    fn session_expired(&self) {
        self.end_session("session expired");
        // Full-page navigation: every piece of view state is stale now.
        self.navigator.hard_redirect(Route::Login);
    }
}

/// Clears the pending flag when a login attempt finishes, however it finishes.
struct PendingLogin<'a>(&'a AtomicBool);

impl Drop for PendingLogin<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the session and mediates every transition of it.
#[derive(Clone)]
pub struct AuthController {
    shared: Arc<SharedState>,
    api: ApiClient,
}

impl AuthController {
    pub fn new(
        store: SessionStore,
        navigator: Navigator,
        api_base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self> {
        let (session, _) = watch::channel(Session::initializing());
        let shared = Arc::new(SharedState {
            store,
            navigator,
            session,
            initialized: AtomicBool::new(false),
            login_pending: AtomicBool::new(false),
        });
        let api = ApiClient::new(api_base_url, request_timeout, shared.clone())?;
        Ok(Self { shared, api })
    }

    /// The HTTP gateway bound to this controller's session.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn navigator(&self) -> &Navigator {
        &self.shared.navigator
    }

    pub fn store(&self) -> &SessionStore {
        &self.shared.store
    }

    /// Observe session changes. The receiver always sees the latest state.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.shared.session.subscribe()
    }

    pub fn session(&self) -> Session {
        self.shared.session.borrow().clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.shared.session.borrow().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.shared.session.borrow().is_authenticated()
    }

    pub fn is_resolved(&self) -> bool {
        self.shared.session.borrow().is_resolved()
    }

    pub fn is_login_pending(&self) -> bool {
        self.shared.login_pending.load(Ordering::SeqCst)
    }

    /// Rehydrate the session from storage. Only the first call does anything.
    pub async fn initialize(&self) -> AuthStatus {
        if self.shared.initialized.swap(true, Ordering::SeqCst) {
            debug!("Session already initialized");
            return self.status();
        }

        let store = self.shared.store.clone();
        let loaded = tokio::task::spawn_blocking(move || store.load())
            .await
            .unwrap_or_else(|e| Err(anyhow::anyhow!("storage read task failed: {}", e)));

        let identity = match loaded {
            Ok(StoredSession::Valid(identity)) => {
                debug!(user = identity.profile.display_name(), "Restored session from storage");
                Some(identity)
            }
            Ok(StoredSession::Empty) => {
                debug!("No stored session");
                None
            }
            Ok(StoredSession::Corrupt(reason)) => {
                warn!(reason = %reason, "Discarding corrupt stored session");
                if let Err(e) = self.shared.store.clear() {
                    error!(error = %e, "Failed to clear corrupt stored session");
                }
                None
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored session, starting signed out");
                None
            }
        };

        self.shared.session.send_modify(|session| {
            // A login that finished while storage was being read wins.
            if !session.is_authenticated() {
                session.set_identity(identity);
            }
            session.mark_resolved();
        });

        let status = self.status();
        info!(?status, "Session initialized");
        status
    }

    /// Sign in. Failures come back as values carrying a displayable message;
    /// the session is untouched unless the login fully succeeds.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, LoginError> {
        if self.shared.login_pending.swap(true, Ordering::SeqCst) {
            debug!("Ignoring login while another is in flight");
            return Err(LoginError::Pending);
        }
        let _pending = PendingLogin(&self.shared.login_pending);

        let response = self.api.authenticate(email, password).await.map_err(|e| {
            warn!(error = %e, "Login failed");
            LoginError::from(e)
        })?;

        if response.token.trim().is_empty() {
            warn!("Login response carried an empty token");
            return Err(LoginError::InvalidResponse("empty token".to_string()));
        }
        if !response.user.is_well_formed() {
            warn!("Login response user has no name or email");
            return Err(LoginError::InvalidResponse("unidentifiable user".to_string()));
        }

        let identity = Identity {
            credential: response.token,
            profile: response.user,
        };

        if let Err(e) = self.shared.store.save(&identity) {
            error!(error = %e, "Failed to persist session");
            return Err(LoginError::Storage(e.to_string()));
        }

        let profile = identity.profile.clone();
        self.shared.session.send_modify(|session| {
            session.set_identity(Some(identity));
            session.mark_resolved();
        });

        info!(user = profile.display_name(), "Login successful");
        Ok(profile)
    }

    /// Sign out locally. No network call; a no-op when already signed out.
    pub fn logout(&self) {
        self.shared.end_session("logout");
    }

    /// Re-read the profile from the backend and write it through.
    ///
    /// A rejected credential ends the session inside the gateway before this
    /// returns `ApiError::SessionExpired`.
    pub async fn refresh_profile(&self) -> Result<Profile, ApiError> {
        let profile = self.api.fetch_profile().await?;
        if !profile.is_well_formed() {
            return Err(ApiError::InvalidResponse("profile has no name or email".to_string()));
        }

        let updated = self.shared.session.send_if_modified(|session| {
            match session.identity().cloned() {
                Some(mut identity) if identity.profile != profile => {
                    identity.profile = profile.clone();
                    session.set_identity(Some(identity));
                    true
                }
                _ => false,
            }
        });

        if updated {
            if let Err(e) = self.shared.store.save_profile(&profile) {
                warn!(error = %e, "Failed to persist refreshed profile");
            }
            debug!(user = profile.display_name(), "Profile refreshed");
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, TOKEN_KEY, USER_KEY};

    fn controller(backend: Arc<MemoryStore>) -> AuthController {
        AuthController::new(
            SessionStore::new(backend),
            Navigator::new(Route::Home),
            "http://127.0.0.1:9",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn seed(backend: &MemoryStore, token: &str, user: &str) {
        backend.set(TOKEN_KEY, token).unwrap();
        backend.set(USER_KEY, user).unwrap();
    }

    #[tokio::test]
    async fn test_initialize_with_valid_record() {
        let backend = Arc::new(MemoryStore::new());
        seed(&backend, "abc", r#"{"name":"A"}"#);
        let auth = controller(backend);

        assert_eq!(auth.status(), AuthStatus::Initializing);
        assert_eq!(auth.initialize().await, AuthStatus::Authenticated);

        let session = auth.session();
        assert!(session.is_resolved());
        assert_eq!(session.credential(), Some("abc"));
        assert_eq!(session.profile(), Some(&Profile::named("A")));
    }

    #[tokio::test]
    async fn test_initialize_with_empty_storage() {
        let auth = controller(Arc::new(MemoryStore::new()));
        assert_eq!(auth.initialize().await, AuthStatus::Unauthenticated);
        assert!(auth.is_resolved());
        assert!(!auth.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_clears_orphaned_token() {
        let backend = Arc::new(MemoryStore::new());
        backend.set(TOKEN_KEY, "abc").unwrap();
        let auth = controller(backend.clone());

        assert_eq!(auth.initialize().await, AuthStatus::Unauthenticated);
        assert_eq!(backend.get(TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_clears_malformed_user() {
        let backend = Arc::new(MemoryStore::new());
        seed(&backend, "abc", "{oops");
        let auth = controller(backend.clone());

        assert_eq!(auth.initialize().await, AuthStatus::Unauthenticated);
        assert_eq!(backend.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(backend.get(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let backend = Arc::new(MemoryStore::new());
        let auth = controller(backend.clone());
        auth.initialize().await;

        // A record appearing later is not picked up by a second call.
        seed(&backend, "abc", r#"{"name":"A"}"#);
        assert_eq!(auth.initialize().await, AuthStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_is_idempotent() {
        let backend = Arc::new(MemoryStore::new());
        seed(&backend, "abc", r#"{"name":"A"}"#);
        let auth = controller(backend.clone());
        auth.initialize().await;
        let mut rx = auth.subscribe();
        rx.borrow_and_update();

        auth.logout();
        assert!(!auth.is_authenticated());
        assert!(auth.store().is_empty());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        auth.logout();
        assert!(!rx.has_changed().unwrap());
        assert_eq!(auth.session(), Session::unauthenticated());
    }

    #[tokio::test]
    async fn test_session_expired_hook_ends_session_and_redirects() {
        let backend = Arc::new(MemoryStore::new());
        seed(&backend, "abc", r#"{"name":"A"}"#);
        let auth = controller(backend);
        auth.initialize().await;

        auth.shared.session_expired();
        assert!(!auth.is_authenticated());
        assert!(auth.store().is_empty());
        assert_eq!(auth.navigator().current(), Route::Login);
        assert_eq!(auth.navigator().reload_generation(), 1);
    }

    #[test]
    fn test_login_error_messages() {
        let rejected = LoginError::from(ApiError::Unauthorized {
            message: Some("Invalid credentials".to_string()),
        });
        assert_eq!(rejected.to_string(), "Invalid credentials");

        let silent = LoginError::from(ApiError::Unauthorized { message: None });
        assert_eq!(silent.to_string(), LOGIN_FALLBACK_MESSAGE);

        let invalid = LoginError::InvalidResponse("missing token".to_string());
        assert_eq!(invalid.to_string(), LOGIN_FALLBACK_MESSAGE);
    }
}
