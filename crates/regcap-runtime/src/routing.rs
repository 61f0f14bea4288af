//! HTTP route registration seam.
//!
//! The issuer never serves HTTP itself. Modules register a handler for
//! every capability path they mint through an [`HttpRouter`], and the
//! issuer removes those routes again on revocation. [`RouteTable`] is the
//! in-process implementation used by the binary and the tests; an
//! embedding HTTP server can implement [`HttpRouter`] directly.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A request delivered to a capability route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub port: u16,
    pub method: String,
    pub path: String,
    pub body: String,
}

/// A handler's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub status: u16,
    pub body: String,
}

impl RouteResponse {
    /// 200 with a body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    /// 404, no route at the requested address.
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: String::new(),
        }
    }

    /// 501, route exists but nothing serves it.
    #[must_use]
    pub fn not_implemented() -> Self {
        Self {
            status: 501,
            body: String::new(),
        }
    }
}

/// Serves requests on one registered route.
pub trait RouteHandler: Send + Sync {
    fn handle(&self, request: &RouteRequest) -> RouteResponse;
}

impl<F> RouteHandler for F
where
    F: Fn(&RouteRequest) -> RouteResponse + Send + Sync,
{
    fn handle(&self, request: &RouteRequest) -> RouteResponse {
        self(request)
    }
}

/// Route registration interface of the hosting HTTP server.
pub trait HttpRouter: Send + Sync {
    /// Registers `handler` for `method path` on `port`, replacing any
    /// handler already at that address.
    fn add_handler(&self, port: u16, method: &str, path: &str, handler: Arc<dyn RouteHandler>);

    /// Removes the handler at an address. Returns `true` if one existed.
    fn remove_handler(&self, port: u16, method: &str, path: &str) -> bool;
}

type RouteKey = (u16, String, String);

/// In-process route table keyed by `(port, method, path)`.
///
/// # Example
///
/// ```
/// use regcap_runtime::{HttpRouter, RouteRequest, RouteResponse, RouteTable};
/// use std::sync::Arc;
///
/// let table = RouteTable::new();
/// table.add_handler(8003, "POST", "/CAPS/x/", Arc::new(|req: &RouteRequest| {
///     RouteResponse::ok(req.body.to_uppercase())
/// }));
///
/// assert_eq!(table.dispatch(8003, "POST", "/CAPS/x/", "hi").body, "HI");
/// assert_eq!(table.dispatch(8004, "POST", "/CAPS/x/", "hi").status, 404);
/// ```
#[derive(Default)]
pub struct RouteTable {
    routes: RwLock<HashMap<RouteKey, Arc<dyn RouteHandler>>>,
}

impl RouteTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a request to the handler at its address.
    ///
    /// Returns 404 when no handler is registered there.
    pub fn dispatch(&self, port: u16, method: &str, path: &str, body: &str) -> RouteResponse {
        let handler = self
            .routes
            .read()
            .get(&(port, method.to_string(), path.to_string()))
            .cloned();

        let Some(handler) = handler else {
            debug!(port, method, path, "No route");
            return RouteResponse::not_found();
        };

        handler.handle(&RouteRequest {
            port,
            method: method.to_string(),
            path: path.to_string(),
            body: body.to_string(),
        })
    }

    /// Returns `true` if a handler is registered at the address.
    #[must_use]
    pub fn contains(&self, port: u16, method: &str, path: &str) -> bool {
        self.routes
            .read()
            .contains_key(&(port, method.to_string(), path.to_string()))
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }

    /// Returns the registered paths on `port`, sorted.
    #[must_use]
    pub fn routes_on(&self, port: u16) -> Vec<String> {
        let mut paths: Vec<String> = self
            .routes
            .read()
            .keys()
            .filter(|(p, _, _)| *p == port)
            .map(|(_, _, path)| path.clone())
            .collect();
        paths.sort();
        paths
    }
}

impl HttpRouter for RouteTable {
    fn add_handler(&self, port: u16, method: &str, path: &str, handler: Arc<dyn RouteHandler>) {
        debug!(port, method, path, "Adding route");
        self.routes
            .write()
            .insert((port, method.to_string(), path.to_string()), handler);
    }

    fn remove_handler(&self, port: u16, method: &str, path: &str) -> bool {
        let removed = self
            .routes
            .write()
            .remove(&(port, method.to_string(), path.to_string()))
            .is_some();
        debug!(port, method, path, removed, "Removing route");
        removed
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo() -> Arc<dyn RouteHandler> {
        Arc::new(|req: &RouteRequest| RouteResponse::ok(format!("{}:{}", req.port, req.body)))
    }

    #[test]
    fn add_dispatch_remove() {
        let table = RouteTable::new();
        table.add_handler(8003, "POST", "/CAPS/a/", echo());

        assert!(table.contains(8003, "POST", "/CAPS/a/"));
        assert_eq!(table.dispatch(8003, "POST", "/CAPS/a/", "x").body, "8003:x");

        assert!(table.remove_handler(8003, "POST", "/CAPS/a/"));
        assert!(!table.remove_handler(8003, "POST", "/CAPS/a/"));
        assert!(table.is_empty());
    }

    #[test]
    fn address_includes_port_and_method() {
        let table = RouteTable::new();
        table.add_handler(8003, "POST", "/p/", echo());

        assert_eq!(table.dispatch(8004, "POST", "/p/", "").status, 404);
        assert_eq!(table.dispatch(8003, "GET", "/p/", "").status, 404);
        assert!(!table.remove_handler(8003, "GET", "/p/"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn add_replaces_existing_handler() {
        let table = RouteTable::new();
        table.add_handler(1, "POST", "/p/", echo());
        table.add_handler(
            1,
            "POST",
            "/p/",
            Arc::new(|_: &RouteRequest| RouteResponse::not_implemented()),
        );

        assert_eq!(table.len(), 1);
        assert_eq!(table.dispatch(1, "POST", "/p/", "").status, 501);
    }

    #[test]
    fn routes_on_port_sorted() {
        let table = RouteTable::new();
        table.add_handler(1, "POST", "/b/", echo());
        table.add_handler(1, "POST", "/a/", echo());
        table.add_handler(2, "POST", "/c/", echo());

        assert_eq!(table.routes_on(1), vec!["/a/", "/b/"]);
        assert_eq!(table.routes_on(3), Vec::<String>::new());
    }
}
