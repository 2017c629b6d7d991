use tokio::sync::watch;
use tracing::debug;

use crate::auth::{AuthController, Session};

use super::{Navigator, Route};

/// What to show for a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet: show a neutral waiting indicator.
    Pending,
    Render(Route),
    /// Not signed in: the current entry has been replaced with this route.
    Redirect(Route),
}

/// Gate in front of every protected view.
pub struct RouteGuard {
    session: watch::Receiver<Session>,
    navigator: Navigator,
}

impl RouteGuard {
    pub fn new(auth: &AuthController) -> Self {
        Self {
            session: auth.subscribe(),
            navigator: auth.navigator().clone(),
        }
    }

    /// The policy itself, free of side effects.
    pub fn decide(session: &Session, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }
        if !session.is_resolved() {
            return GuardDecision::Pending;
        }
        if session.is_authenticated() {
            GuardDecision::Render(route)
        } else {
            GuardDecision::Redirect(Route::Login)
        }
    }

    /// Decide for the current history entry, applying a redirect if needed.
    pub fn evaluate(&mut self) -> GuardDecision {
        let route = self.navigator.current();
        let decision = {
            let session = self.session.borrow_and_update();
            Self::decide(&session, route)
        };

        if let GuardDecision::Redirect(target) = decision {
            debug!(from = %route, to = %target, "Guard redirect");
            // Replace so back-navigation cannot reach the blocked view.
            self.navigator.replace(target);
        }
        decision
    }

    /// True when the session changed since the last `evaluate`.
    pub fn session_changed(&self) -> bool {
        self.session.has_changed().unwrap_or(false)
    }

    /// Wait for the next session change, then re-evaluate.
    pub async fn next_decision(&mut self) -> GuardDecision {
        if self.session.changed().await.is_err() {
            debug!("Session owner dropped");
        }
        self.evaluate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Identity, Profile};

    fn signed_in() -> Session {
        Session::authenticated(Identity {
            credential: "abc".to_string(),
            profile: Profile::named("A"),
        })
    }

    #[test]
    fn test_pending_until_resolved() {
        let session = Session::initializing();
        for route in [Route::Home, Route::Requests, Route::SubmitLaser] {
            assert_eq!(RouteGuard::decide(&session, route), GuardDecision::Pending);
        }
    }

    #[test]
    fn test_login_always_renders() {
        for session in [Session::initializing(), Session::unauthenticated(), signed_in()] {
            assert_eq!(
                RouteGuard::decide(&session, Route::Login),
                GuardDecision::Render(Route::Login)
            );
        }
    }

    #[test]
    fn test_protected_routes() {
        for route in Route::ALL.into_iter().filter(Route::is_protected) {
            assert_eq!(
                RouteGuard::decide(&Session::unauthenticated(), route),
                GuardDecision::Redirect(Route::Login)
            );
            assert_eq!(RouteGuard::decide(&signed_in(), route), GuardDecision::Render(route));
        }
    }
}
