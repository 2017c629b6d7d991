use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::Route;

#[derive(Debug)]
struct History {
    entries: Vec<Route>,
    index: usize,
    /// Bumped on every hard redirect; front ends drop their view state when it changes.
    reload_generation: u64,
}

/// Navigation history shared by every part of the client.
#[derive(Clone, Debug)]
pub struct Navigator {
    history: Arc<Mutex<History>>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            history: Arc::new(Mutex::new(History {
                entries: vec![start],
                index: 0,
                reload_generation: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Route {
        let history = self.lock();
        history.entries[history.index]
    }

    /// Add a history entry, dropping anything forward of the current one.
    pub fn push(&self, route: Route) {
        let mut history = self.lock();
        let index = history.index;
        if history.entries[index] == route {
            return;
        }
        history.entries.truncate(index + 1);
        history.entries.push(route);
        history.index += 1;
        debug!(%route, "Navigated (push)");
    }

    /// Swap the current entry so the old one is unreachable through `back`.
    pub fn replace(&self, route: Route) {
        let mut history = self.lock();
        let index = history.index;
        history.entries[index] = route;
        debug!(%route, "Navigated (replace)");
    }

    /// Follow a path; unknown paths land on the home view.
    pub fn navigate_path(&self, path: &str) -> Route {
        let route = Route::parse(path).unwrap_or_else(|| {
            debug!(path, "Unknown path, falling back to home");
            Route::Home
        });
        self.push(route);
        route
    }

    /// Returns false when there is nothing to go back to.
    pub fn back(&self) -> bool {
        let mut history = self.lock();
        if history.index == 0 {
            return false;
        }
        history.index -= 1;
        debug!(route = %history.entries[history.index], "Navigated back");
        true
    }

    pub fn forward(&self) -> bool {
        let mut history = self.lock();
        if history.index + 1 >= history.entries.len() {
            return false;
        }
        history.index += 1;
        true
    }

    /// Full-page navigation: a new entry plus a reset of all client view state.
    pub fn hard_redirect(&self, route: Route) {
        let mut history = self.lock();
        let index = history.index;
        history.entries.truncate(index + 1);
        history.entries.push(route);
        history.index = history.entries.len() - 1;
        history.reload_generation += 1;
        debug!(%route, generation = history.reload_generation, "Hard redirect");
    }

    pub fn reload_generation(&self) -> u64 {
        self.lock().reload_generation
    }

    pub fn can_go_back(&self) -> bool {
        self.lock().index > 0
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_back() {
        let nav = Navigator::new(Route::Home);
        nav.push(Route::SubmitPva);
        assert_eq!(nav.current(), Route::SubmitPva);

        assert!(nav.back());
        assert_eq!(nav.current(), Route::Home);
        assert!(!nav.back());

        assert!(nav.forward());
        assert_eq!(nav.current(), Route::SubmitPva);
        assert!(!nav.forward());
    }

    #[test]
    fn test_push_same_route_is_noop() {
        let nav = Navigator::new(Route::Home);
        nav.push(Route::Home);
        assert!(!nav.can_go_back());
    }

    #[test]
    fn test_push_discards_forward_entries() {
        let nav = Navigator::new(Route::Home);
        nav.push(Route::SubmitPva);
        nav.back();
        nav.push(Route::Requests);
        assert!(!nav.forward());
        assert!(nav.back());
        assert_eq!(nav.current(), Route::Home);
    }

    #[test]
    fn test_replace_hides_previous_entry() {
        let nav = Navigator::new(Route::Home);
        nav.push(Route::Requests);
        nav.replace(Route::Login);
        assert_eq!(nav.current(), Route::Login);
        assert!(nav.back());
        assert_eq!(nav.current(), Route::Home);
        nav.forward();
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn test_unknown_path_goes_home() {
        let nav = Navigator::new(Route::Login);
        assert_eq!(nav.navigate_path("/submit"), Route::Home);
        assert_eq!(nav.current(), Route::Home);
        assert_eq!(nav.navigate_path("/submit/laser"), Route::SubmitLaser);
    }

    #[test]
    fn test_hard_redirect_bumps_generation() {
        let nav = Navigator::new(Route::Home);
        assert_eq!(nav.reload_generation(), 0);
        nav.hard_redirect(Route::Login);
        assert_eq!(nav.current(), Route::Login);
        assert_eq!(nav.reload_generation(), 1);
    }
}
