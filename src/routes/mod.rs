/// Router Module Index
///
/// Client-side routing for the application shell. The route table is static:
/// it is assembled once at startup by `app_routes` and never changes. There are
/// no guards, so resolving a path never looks at the auth session.

/// Static path → view mapping and path matching rules.
pub mod table;

/// Tracks the currently rendered route.
pub mod navigator;

pub use navigator::Navigator;
pub use table::{Route, RouteError, RouteTable, View};

/// app_routes
///
/// Assembles the application's route table mounted under `base`.
///
/// - `/login` renders the login view (name `Login`).
/// - `/` renders the home view (name `Home`).
///
/// Anything else resolves to the table's not-found route.
pub fn app_routes(base: &str) -> Result<RouteTable, RouteError> {
    RouteTable::new(
        base,
        vec![
            Route::new("/login", "Login", View::Login),
            Route::new("/", "Home", View::Home),
        ],
    )
}
