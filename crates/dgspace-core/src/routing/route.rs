/// Every view the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Home,
    SubmitPva,
    SubmitResin,
    SubmitLaser,
    Requests,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Login,
        Route::Home,
        Route::SubmitPva,
        Route::SubmitResin,
        Route::SubmitLaser,
        Route::Requests,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/",
            Route::SubmitPva => "/submit/pva",
            Route::SubmitResin => "/submit/resin",
            Route::SubmitLaser => "/submit/laser",
            Route::Requests => "/requests",
        }
    }

    /// Look up a route by path. Trailing slashes are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        Route::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Only the login view is reachable without a session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Log In",
            Route::Home => "Home",
            Route::SubmitPva => "PVA 3D Print Form",
            Route::SubmitResin => "Resin 3D Print Form",
            Route::SubmitLaser => "Laser Cutting Form",
            Route::Requests => "My Requests",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
