/// Pages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Auth,
    Dashboard,
}

/// Resolves where a request for `requested` ends up.
/// The dashboard needs a token; the auth page is skipped when one is present.
pub fn guard(requested: Route, has_token: bool) -> Route {
    match (requested, has_token) {
        (Route::Dashboard, false) => Route::Auth,
        (Route::Auth, true) => Route::Dashboard,
        (route, _) => route,
    }
}
