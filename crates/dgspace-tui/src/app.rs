//! Application state management for the DG Space terminal client.
//!
//! `App` holds the view state of the client: which view the route guard
//! allowed, the login form, the dashboard selection and overlays. Session
//! state itself belongs to the `AuthController` the app is given.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use anyhow::Result;
use dgspace_core::api::ApiError;
use dgspace_core::config::Config;
use dgspace_core::routing::{GuardDecision, Navigator, Route, RouteGuard};
use dgspace_core::AuthController;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length for email input.
/// USD addresses are short; 64 chars leaves room for aliases.
const MAX_EMAIL_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Shown when the form is submitted with an empty field
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Please enter both email and password";

/// Shown after the backend rejected the stored credential
const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please log in again.";

/// Environment variable pre-filling the login email
const EMAIL_ENV: &str = "DGSPACE_EMAIL";

// ============================================================================
// Request Types
// ============================================================================

/// A service that can be requested from the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestType {
    pub title: &'static str,
    pub description: &'static str,
    pub route: Route,
}

pub const REQUEST_TYPES: [RequestType; 3] = [
    RequestType {
        title: "PVA 3D Print",
        description: "PVA (water-soluble support) printing for complex geometries and overhangs.",
        route: Route::SubmitPva,
    },
    RequestType {
        title: "Resin 3D Print",
        description: "Resin printing for high-detail models and a smooth surface finish.",
        route: Route::SubmitResin,
    },
    RequestType {
        title: "Laser Cutting",
        description: "Laser cutting for precise cuts on wood, acrylic, and more.",
        route: Route::SubmitLaser,
    },
];

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// What the main area shows, as decided by the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Login,
    Page(Route),
}

impl From<GuardDecision> for View {
    fn from(decision: GuardDecision) -> Self {
        match decision {
            GuardDecision::Pending => View::Loading,
            GuardDecision::Render(Route::Login) | GuardDecision::Redirect(_) => View::Login,
            GuardDecision::Render(route) => View::Page(route),
        }
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    pub auth: AuthController,
    guard: RouteGuard,

    // UI State
    pub state: AppState,
    pub view: View,
    pub card_selection: usize,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    /// Set when the form was submitted; the login runs on the next tick so
    /// the disabled button is drawn first.
    pub login_submitted: bool,

    pub status_message: Option<String>,
    pub signed_in_at: Option<DateTime<Local>>,

    reload_generation: u64,
}

impl App {
    /// Create a new application instance from the saved configuration
    pub fn new(config: Config) -> Result<Self> {
        let store = config.open_session_store()?;
        let api_url = config.api_base_url();
        debug!(%api_url, storage = ?config.storage, "Building auth controller");

        let auth = AuthController::new(
            store,
            Navigator::new(Route::Home),
            &api_url,
            config.request_timeout(),
        )?;
        Ok(Self::with_controller(config, auth))
    }

    pub fn with_controller(config: Config, auth: AuthController) -> Self {
        let login_email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let guard = RouteGuard::new(&auth);
        let reload_generation = auth.navigator().reload_generation();

        Self {
            config,
            auth,
            guard,

            state: AppState::Normal,
            view: View::Loading,
            card_selection: 0,

            login_focus: if login_email.is_empty() {
                LoginFocus::Email
            } else {
                LoginFocus::Password
            },
            login_email,
            login_password: String::new(),
            login_error: None,
            login_submitted: false,

            status_message: None,
            signed_in_at: None,

            reload_generation,
        }
    }

    fn navigator(&self) -> &Navigator {
        self.auth.navigator()
    }

    /// Rehydrate the session, then validate it against the backend.
    pub async fn start(&mut self) {
        self.sync_view();
        self.auth.initialize().await;
        self.sync_view();

        if self.auth.is_authenticated() {
            self.signed_in_at = Some(Local::now());
            self.refresh_profile().await;
        }
    }

    /// Re-run the route guard and pick up any hard redirect.
    pub fn sync_view(&mut self) {
        let generation = self.navigator().reload_generation();
        if generation != self.reload_generation {
            self.reload_generation = generation;
            self.reset_view_state();
            self.status_message = Some(SESSION_EXPIRED_MESSAGE.to_string());
            info!("Client state reset after hard redirect");
        }

        let view = View::from(self.guard.evaluate());
        if view != self.view {
            debug!(?view, "View changed");
            self.view = view;
        }
    }

    /// Discard everything a full page load would discard.
    fn reset_view_state(&mut self) {
        self.state = AppState::Normal;
        self.card_selection = 0;
        self.login_password.clear();
        self.login_error = None;
        self.login_submitted = false;
        self.signed_in_at = None;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Validate the form and queue the login. Ignored while one is pending.
    pub fn submit_login(&mut self) {
        if self.login_submitted || self.auth.is_login_pending() {
            return;
        }
        self.login_error = None;

        if self.login_email.trim().is_empty() || self.login_password.is_empty() {
            self.login_error = Some(MISSING_CREDENTIALS_MESSAGE.to_string());
            return;
        }
        self.login_submitted = true;
    }

    /// Whether the submit action is disabled right now
    pub fn login_in_flight(&self) -> bool {
        self.login_submitted || self.auth.is_login_pending()
    }

    /// Run a queued login, if any.
    pub async fn process_pending_login(&mut self) {
        if !self.login_submitted {
            return;
        }
        let email = self.login_email.trim().to_string();
        let password = std::mem::take(&mut self.login_password);

        let result = self.auth.login(&email, &password).await;
        self.login_submitted = false;

        match result {
            Ok(profile) => {
                self.login_error = None;
                self.signed_in_at = Some(Local::now());
                self.status_message = Some(format!("Signed in as {}", profile.display_name()));

                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.navigator().push(Route::Home);
            }
            Err(e) => {
                self.login_error = Some(e.to_string());
                self.login_focus = LoginFocus::Password;
            }
        }
        self.sync_view();
    }

    pub fn logout(&mut self) {
        self.auth.logout();
        self.navigator().push(Route::Login);
        self.reset_view_state();
        self.status_message = Some("Logged out".to_string());
        self.sync_view();
    }

    /// Re-read the profile. An expired session surfaces only as the redirect.
    pub async fn refresh_profile(&mut self) {
        match self.auth.refresh_profile().await {
            Ok(profile) => {
                debug!(user = profile.display_name(), "Profile up to date");
            }
            Err(ApiError::SessionExpired) => {}
            Err(e) => {
                warn!(error = %e, "Failed to refresh profile");
                self.status_message = Some("Could not reach the server".to_string());
            }
        }
        self.sync_view();
    }

    /// Name used in the dashboard greeting.
    pub fn greeting_name(&self) -> String {
        self.auth
            .session()
            .profile()
            .and_then(|p| p.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Student".to_string())
    }

    /// Name shown in the title bar.
    pub fn user_label(&self) -> Option<String> {
        self.auth
            .session()
            .profile()
            .map(|p| p.display_name().to_string())
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn open(&mut self, route: Route) {
        self.navigator().push(route);
        self.sync_view();
    }

    pub fn open_path(&mut self, path: &str) {
        self.navigator().navigate_path(path);
        self.sync_view();
    }

    pub fn go_back(&mut self) {
        if self.navigator().back() {
            self.sync_view();
        }
    }

    pub fn open_selected_card(&mut self) {
        if let Some(request) = REQUEST_TYPES.get(self.card_selection) {
            self.open(request.route);
        }
    }

    pub fn next_card(&mut self) {
        self.card_selection = (self.card_selection + 1) % REQUEST_TYPES.len();
    }

    pub fn prev_card(&mut self) {
        self.card_selection = (self.card_selection + REQUEST_TYPES.len() - 1) % REQUEST_TYPES.len();
    }

    /// "just now" / "5m ago" style age of the current sign-in
    pub fn signed_in_display(&self) -> Option<String> {
        let since = self.signed_in_at?;
        let minutes = (Local::now() - since).num_minutes();
        Some(if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else {
            format!("{}h ago", minutes / 60)
        })
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use dgspace_core::storage::{KeyValueStore, MemoryStore, SessionStore, TOKEN_KEY, USER_KEY};

    fn app_with(backend: Arc<MemoryStore>) -> App {
        let auth = AuthController::new(
            SessionStore::new(backend),
            Navigator::new(Route::Home),
            "http://127.0.0.1:9",
            Duration::from_secs(1),
        )
        .unwrap();
        let config = Config {
            last_email: Some("user@usd.edu".to_string()),
            ..Config::default()
        };
        App::with_controller(config, auth)
    }

    fn seeded() -> Arc<MemoryStore> {
        let backend = Arc::new(MemoryStore::new());
        backend.set(TOKEN_KEY, "abc").unwrap();
        backend.set(USER_KEY, r#"{"name":"Ada","email":"ada@usd.edu"}"#).unwrap();
        backend
    }

    // -------------------------------------------------------------------------
    // View Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_view_from_guard_decision() {
        assert_eq!(View::from(GuardDecision::Pending), View::Loading);
        assert_eq!(View::from(GuardDecision::Render(Route::Login)), View::Login);
        assert_eq!(View::from(GuardDecision::Redirect(Route::Login)), View::Login);
        assert_eq!(View::from(GuardDecision::Render(Route::Requests)), View::Page(Route::Requests));
    }

    #[test]
    fn test_loading_before_start() {
        let mut app = app_with(Arc::new(MemoryStore::new()));
        app.sync_view();
        assert_eq!(app.view, View::Loading);
    }

    #[tokio::test]
    async fn test_start_without_session_shows_login() {
        let mut app = app_with(Arc::new(MemoryStore::new()));
        app.auth.initialize().await;
        app.sync_view();
        assert_eq!(app.view, View::Login);
        assert_eq!(app.auth.navigator().current(), Route::Login);
    }

    #[tokio::test]
    async fn test_restored_session_shows_dashboard() {
        let mut app = app_with(seeded());
        app.auth.initialize().await;
        app.sync_view();
        assert_eq!(app.view, View::Page(Route::Home));
        assert_eq!(app.greeting_name(), "Ada");
        assert_eq!(app.user_label().as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_logout_returns_to_login() {
        let mut app = app_with(seeded());
        app.auth.initialize().await;
        app.sync_view();

        app.logout();
        assert_eq!(app.view, View::Login);
        assert!(!app.auth.is_authenticated());
        assert!(app.auth.store().is_empty());
    }

    #[tokio::test]
    async fn test_hard_redirect_resets_view_state() {
        let mut app = app_with(seeded());
        app.auth.initialize().await;
        app.sync_view();
        app.card_selection = 2;

        app.auth.logout();
        app.auth.navigator().hard_redirect(Route::Login);
        app.sync_view();

        assert_eq!(app.view, View::Login);
        assert_eq!(app.card_selection, 0);
        assert_eq!(app.status_message.as_deref(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[tokio::test]
    async fn test_unknown_path_lands_on_home() {
        let mut app = app_with(seeded());
        app.auth.initialize().await;
        app.open(Route::Requests);
        app.open_path("/submit");
        assert_eq!(app.view, View::Page(Route::Home));
    }

    // -------------------------------------------------------------------------
    // Login Form Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_submit_requires_both_fields() {
        let mut app = app_with(Arc::new(MemoryStore::new()));
        app.login_email.clear();
        app.login_password = "secret".to_string();

        app.submit_login();
        assert!(!app.login_submitted);
        assert_eq!(app.login_error.as_deref(), Some(MISSING_CREDENTIALS_MESSAGE));

        app.login_email = "user@usd.edu".to_string();
        app.login_password.clear();
        app.submit_login();
        assert!(!app.login_submitted);
    }

    #[test]
    fn test_submit_is_disabled_while_in_flight() {
        let mut app = app_with(Arc::new(MemoryStore::new()));
        app.login_password = "secret".to_string();

        app.submit_login();
        assert!(app.login_in_flight());

        app.login_error = Some("stale".to_string());
        app.submit_login();
        // Second submit was ignored, so the old error was not cleared.
        assert_eq!(app.login_error.as_deref(), Some("stale"));
    }

    #[test]
    fn test_email_prefilled_from_config() {
        let app = app_with(Arc::new(MemoryStore::new()));
        if std::env::var(EMAIL_ENV).is_err() {
            assert_eq!(app.login_email, "user@usd.edu");
            assert_eq!(app.login_focus, LoginFocus::Password);
        }
    }

    // -------------------------------------------------------------------------
    // Dashboard Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_card_selection_wraps() {
        let mut app = app_with(Arc::new(MemoryStore::new()));
        app.prev_card();
        assert_eq!(app.card_selection, 2);
        app.next_card();
        assert_eq!(app.card_selection, 0);
        app.next_card();
        assert_eq!(app.card_selection, 1);
    }

    #[test]
    fn test_greeting_defaults_to_student() {
        let app = app_with(Arc::new(MemoryStore::new()));
        assert_eq!(app.greeting_name(), "Student");
        assert!(app.user_label().is_none());
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(63, '@'));
        assert!(!can_add_email_char(64, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(can_add_password_char(0, ' '));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
    }
}
