//! Standard route-backed handler module.

use super::HandlerModule;
use crate::routing::{HttpRouter, RouteHandler, RouteRequest, RouteResponse};
use parking_lot::RwLock;
use regcap_types::RegionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Who a capability route was issued to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityContext {
    pub module: String,
    pub session_id: String,
    pub region: RegionHandle,
}

/// Serves the requests arriving on a module's capability routes.
pub trait CapabilityService: Send + Sync {
    fn serve(&self, context: &CapabilityContext, request: &RouteRequest) -> RouteResponse;
}

impl<F> CapabilityService for F
where
    F: Fn(&CapabilityContext, &RouteRequest) -> RouteResponse + Send + Sync,
{
    fn serve(&self, context: &CapabilityContext, request: &RouteRequest) -> RouteResponse {
        self(context, request)
    }
}

fn not_served(_: &CapabilityContext, _: &RouteRequest) -> RouteResponse {
    RouteResponse::not_implemented()
}

/// [`HandlerModule`] that mints `/CAPS/<name>/<id>/` fragments and serves
/// each one as a POST route on its port.
///
/// Without a service attached every route answers 501.
///
/// # Example
///
/// ```
/// use regcap_runtime::{
///     CapabilityContext, FrontDoorModule, HandlerModule, RouteRequest, RouteResponse, RouteTable,
/// };
/// use regcap_types::RegionHandle;
/// use std::sync::Arc;
///
/// let router = Arc::new(RouteTable::new());
/// let module = FrontDoorModule::new("inventory", 8003, router.clone()).with_service(Arc::new(
///     |ctx: &CapabilityContext, _req: &RouteRequest| RouteResponse::ok(ctx.session_id.clone()),
/// ));
///
/// let fragment = module.mint_url("sess1", RegionHandle::new(1000));
/// assert!(fragment.starts_with("/CAPS/inventory/"));
/// assert_eq!(router.dispatch(8003, "POST", &fragment, "").body, "sess1");
/// ```
pub struct FrontDoorModule {
    name: String,
    port: u16,
    router: Arc<dyn HttpRouter>,
    service: Arc<dyn CapabilityService>,
    active: RwLock<HashMap<String, CapabilityContext>>,
}

impl FrontDoorModule {
    /// HTTP method capability routes are registered under.
    pub const METHOD: &'static str = "POST";

    /// Creates a module serving on `port` through `router`.
    pub fn new(name: impl Into<String>, port: u16, router: Arc<dyn HttpRouter>) -> Self {
        Self {
            name: name.into(),
            port,
            router,
            service: Arc::new(not_served),
            active: RwLock::new(HashMap::new()),
        }
    }

    /// Attaches the service answering capability requests.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn CapabilityService>) -> Self {
        self.service = service;
        self
    }

    /// Returns the fragments currently served, sorted.
    #[must_use]
    pub fn active_fragments(&self) -> Vec<String> {
        let mut fragments: Vec<String> = self.active.read().keys().cloned().collect();
        fragments.sort();
        fragments
    }

    /// Returns who a served fragment was issued to.
    #[must_use]
    pub fn context(&self, fragment: &str) -> Option<CapabilityContext> {
        self.active.read().get(fragment).cloned()
    }

    fn serve_fragment(&self, session_id: &str, region: RegionHandle, fragment: &str) {
        let context = CapabilityContext {
            module: self.name.clone(),
            session_id: session_id.to_string(),
            region,
        };

        let service = Arc::clone(&self.service);
        let route_context = context.clone();
        let handler: Arc<dyn RouteHandler> =
            Arc::new(move |request: &RouteRequest| service.serve(&route_context, request));

        self.router
            .add_handler(self.port, Self::METHOD, fragment, handler);
        self.active.write().insert(fragment.to_string(), context);
    }
}

impl HandlerModule for FrontDoorModule {
    fn url_name(&self) -> &str {
        &self.name
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn mint_url(&self, session_id: &str, region: RegionHandle) -> String {
        let fragment = format!("/CAPS/{}/{}/", self.name, Uuid::new_v4().simple());
        self.serve_fragment(session_id, region, &fragment);
        fragment
    }

    fn reattach(&self, session_id: &str, region: RegionHandle, fragment: &str) {
        debug!(module = %self.name, %region, fragment, "Reattaching capability route");
        self.serve_fragment(session_id, region, fragment);
    }

    fn deregister(&self, fragment: &str) {
        self.active.write().remove(fragment);
    }
}

impl std::fmt::Debug for FrontDoorModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrontDoorModule")
            .field("name", &self.name)
            .field("port", &self.port)
            .field("active", &self.active.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RouteTable;

    #[test]
    fn mint_registers_post_route() {
        let router = Arc::new(RouteTable::new());
        let module = FrontDoorModule::new("inventory", 8003, router.clone());

        let fragment = module.mint_url("s", RegionHandle::new(1));

        assert!(fragment.starts_with("/CAPS/inventory/"));
        assert!(fragment.ends_with('/'));
        assert!(router.contains(8003, "POST", &fragment));
        assert_eq!(router.dispatch(8003, "POST", &fragment, "").status, 501);
    }

    #[test]
    fn fragments_are_unique() {
        let router = Arc::new(RouteTable::new());
        let module = FrontDoorModule::new("asset", 8004, router.clone());

        let a = module.mint_url("s", RegionHandle::new(1));
        let b = module.mint_url("s", RegionHandle::new(1));
        assert_ne!(a, b);
        assert_eq!(router.routes_on(8004).len(), 2);
    }

    #[test]
    fn reattach_serves_known_fragment() {
        let router = Arc::new(RouteTable::new());
        let module = FrontDoorModule::new("inventory", 8003, router.clone()).with_service(
            Arc::new(|ctx: &CapabilityContext, req: &RouteRequest| {
                RouteResponse::ok(format!("{}@{}:{}", ctx.session_id, ctx.region, req.body))
            }),
        );

        module.reattach("sess1", RegionHandle::new(1000), "/CAPS/inventory/old/");

        let response = router.dispatch(8003, "POST", "/CAPS/inventory/old/", "ping");
        assert_eq!(response.body, "sess1@1000:ping");
        assert_eq!(
            module.context("/CAPS/inventory/old/").unwrap().region,
            RegionHandle::new(1000)
        );
    }

    #[test]
    fn deregister_forgets_fragment() {
        let router = Arc::new(RouteTable::new());
        let module = FrontDoorModule::new("inventory", 8003, router);

        let fragment = module.mint_url("s", RegionHandle::new(1));
        assert_eq!(module.active_fragments(), vec![fragment.clone()]);

        module.deregister(&fragment);
        assert!(module.active_fragments().is_empty());
    }
}
