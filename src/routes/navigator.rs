use super::table::{Route, RouteError, RouteTable};

/// Navigator
///
/// Holds the route table and the route currently rendered. Navigation only
/// swaps the current route; it never reads or writes any other state.
#[derive(Debug, Clone)]
pub struct Navigator {
    table: RouteTable,
    current: Route,
}

impl Navigator {
    /// Starts at whatever `initial_location` resolves to.
    pub fn new(table: RouteTable, initial_location: &str) -> Self {
        let current = table.resolve(initial_location).clone();
        Self { table, current }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// push
    ///
    /// Navigates to `location`. Unknown locations land on the not-found route.
    pub fn push(&mut self, location: &str) -> &Route {
        let next = self.table.resolve(location).clone();
        tracing::debug!(from = %self.current.name, to = %next.name, %location, "navigate");
        self.current = next;
        &self.current
    }

    /// Navigates to the route called `name`; the current route is kept on error.
    pub fn push_named(&mut self, name: &str) -> Result<&Route, RouteError> {
        let next = self
            .table
            .resolve_name(name)
            .cloned()
            .ok_or_else(|| RouteError::UnknownName(name.to_string()))?;
        tracing::debug!(from = %self.current.name, to = %next.name, "navigate by name");
        self.current = next;
        Ok(&self.current)
    }
}
