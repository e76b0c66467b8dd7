use std::fmt;

use thiserror::Error;

/// Path reported by the fallback route. Display-only: the fallback is chosen
/// when nothing else matches, never by matching this value.
pub const NOT_FOUND_PATH: &str = "*";

/// Name of the fallback route.
pub const NOT_FOUND_NAME: &str = "NotFound";

/// View
///
/// The views the shell knows how to render. Routing treats them as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    Home,
    NotFound,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Login => "LoginView",
            View::Home => "HomeView",
            View::NotFound => "NotFoundView",
        };
        f.write_str(name)
    }
}

/// Route
///
/// A single route entry: `path` and `name` are each unique within a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub name: String,
    pub view: View,
}

impl Route {
    pub fn new(path: &str, name: &str, view: View) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            view,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("route path must start with '/': {0:?}")]
    InvalidPath(String),

    #[error("duplicate route path: {0}")]
    DuplicatePath(String),

    #[error("duplicate route name: {0}")]
    DuplicateName(String),

    #[error("no route named {0:?}")]
    UnknownName(String),
}

/// RouteTable
///
/// Immutable path → view mapping with a not-found fallback, mounted under a
/// base path.
///
/// Matching follows the usual history-router defaults: query and fragment
/// are ignored, comparison is case-insensitive and one trailing slash is
/// tolerated. A location outside the base path never matches.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base: String,
    routes: Vec<Route>,
    not_found: Route,
}

impl RouteTable {
    /// new
    ///
    /// Validates and normalizes the entries. Paths must start with `/`; paths
    /// (compared the way lookups compare them) and names must be unique.
    pub fn new(base: &str, routes: Vec<Route>) -> Result<Self, RouteError> {
        let mut normalized: Vec<Route> = Vec::with_capacity(routes.len());

        for mut route in routes {
            if !route.path.starts_with('/') {
                return Err(RouteError::InvalidPath(route.path));
            }
            route.path = trim_trailing_slash(&route.path).to_string();

            if normalized
                .iter()
                .any(|r| r.path.eq_ignore_ascii_case(&route.path))
            {
                return Err(RouteError::DuplicatePath(route.path));
            }
            if normalized.iter().any(|r| r.name == route.name) {
                return Err(RouteError::DuplicateName(route.name));
            }
            normalized.push(route);
        }

        let base = base.trim_end_matches('/');
        let base = if base.is_empty() || base.starts_with('/') {
            base.to_string()
        } else {
            format!("/{base}")
        };

        Ok(Self {
            base,
            routes: normalized,
            not_found: Route::new(NOT_FOUND_PATH, NOT_FOUND_NAME, View::NotFound),
        })
    }

    /// resolve
    ///
    /// Maps a location (path, optionally with query and fragment) to exactly
    /// one route, falling back to the not-found route.
    pub fn resolve(&self, location: &str) -> &Route {
        self.strip_base(strip_query_and_fragment(location))
            .and_then(|path| {
                let path = trim_trailing_slash(&path).to_string();
                self.routes
                    .iter()
                    .find(|r| r.path.eq_ignore_ascii_case(&path))
            })
            .unwrap_or(&self.not_found)
    }

    /// Looks a route up by its navigation name.
    pub fn resolve_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name == name)
    }

    /// href
    ///
    /// The full location (base path included) that navigates to `name`.
    pub fn href(&self, name: &str) -> Result<String, RouteError> {
        let route = self
            .resolve_name(name)
            .ok_or_else(|| RouteError::UnknownName(name.to_string()))?;

        if self.base.is_empty() {
            Ok(route.path.clone())
        } else if route.path == "/" {
            Ok(format!("{}/", self.base))
        } else {
            Ok(format!("{}{}", self.base, route.path))
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn not_found(&self) -> &Route {
        &self.not_found
    }

    /// Base path without its trailing slash; empty when mounted at `/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn strip_base(&self, path: &str) -> Option<String> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if self.base.is_empty() {
            return Some(path);
        }

        let prefix = path.get(..self.base.len())?;
        if !prefix.eq_ignore_ascii_case(&self.base) {
            return None;
        }

        let rest = &path[self.base.len()..];
        if rest.is_empty() {
            Some("/".to_string())
        } else if rest.starts_with('/') {
            Some(rest.to_string())
        } else {
            None
        }
    }
}

fn strip_query_and_fragment(location: &str) -> &str {
    location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
}

fn trim_trailing_slash(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}
