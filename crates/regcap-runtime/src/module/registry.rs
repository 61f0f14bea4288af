//! Module registry.

use super::{HandlerModule, RegistryError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct Inner {
    /// Registration order.
    modules: Vec<Arc<dyn HandlerModule>>,
    by_name: HashMap<String, usize>,
}

/// Registered handler modules, keyed by URL name.
///
/// Read-mostly: issuance and revocation take the read lock, so modules
/// can still be registered after startup.
///
/// # Example
///
/// ```
/// use regcap_runtime::{FrontDoorModule, ModuleRegistry, RegistryError, RouteTable};
/// use std::sync::Arc;
///
/// let router = Arc::new(RouteTable::new());
/// let registry = ModuleRegistry::new();
/// registry.register(Arc::new(FrontDoorModule::new("inventory", 8003, router.clone()))).unwrap();
///
/// let err = registry
///     .register(Arc::new(FrontDoorModule::new("inventory", 9000, router)))
///     .unwrap_err();
/// assert_eq!(err, RegistryError::DuplicateModule("inventory".into()));
/// ```
#[derive(Default)]
pub struct ModuleRegistry {
    inner: RwLock<Inner>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module under its URL name.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateModule`] if the name is taken.
    /// - [`RegistryError::InvalidName`] if the name is empty or contains `/`.
    pub fn register(&self, module: Arc<dyn HandlerModule>) -> Result<(), RegistryError> {
        let name = module.url_name().to_string();
        if name.is_empty() || name.contains('/') {
            return Err(RegistryError::invalid_name(name));
        }

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(&name) {
            return Err(RegistryError::duplicate(name));
        }

        debug!(module = %name, port = module.port(), "Registered module");
        let index = inner.modules.len();
        inner.modules.push(module);
        inner.by_name.insert(name, index);
        Ok(())
    }

    /// Looks up a module by URL name.
    #[must_use]
    pub fn lookup(&self, url_name: &str) -> Option<Arc<dyn HandlerModule>> {
        let inner = self.inner.read();
        inner
            .by_name
            .get(url_name)
            .map(|&index| Arc::clone(&inner.modules[index]))
    }

    /// Returns all modules in registration order.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn HandlerModule>> {
        self.inner.read().modules.clone()
    }

    /// Returns all URL names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.inner
            .read()
            .modules
            .iter()
            .map(|m| m.url_name().to_string())
            .collect()
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().modules.len()
    }

    /// Returns `true` if no modules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingModule;

    #[test]
    fn register_and_lookup() {
        let registry = ModuleRegistry::new();
        registry.register(Arc::new(RecordingModule::new("inventory", 8003))).unwrap();
        registry.register(Arc::new(RecordingModule::new("asset", 8004))).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("inventory").unwrap().port(), 8003);
        assert_eq!(registry.lookup("asset").unwrap().port(), 8004);
        assert!(registry.lookup("missing").is_none());
    }

    #[test]
    fn duplicate_name_rejected_and_first_kept() {
        let registry = ModuleRegistry::new();
        registry.register(Arc::new(RecordingModule::new("inventory", 8003))).unwrap();

        let err = registry
            .register(Arc::new(RecordingModule::new("inventory", 9999)))
            .unwrap_err();
        assert_eq!(err, RegistryError::duplicate("inventory"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("inventory").unwrap().port(), 8003);
    }

    #[test]
    fn invalid_names_rejected() {
        let registry = ModuleRegistry::new();
        for name in ["", "a/b"] {
            let err = registry
                .register(Arc::new(RecordingModule::new(name, 1)))
                .unwrap_err();
            assert!(matches!(err, RegistryError::InvalidName(_)));
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn all_preserves_registration_order() {
        let registry = ModuleRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(Arc::new(RecordingModule::new(name, 1))).unwrap();
        }

        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        let order: Vec<_> = registry.all().iter().map(|m| m.url_name().to_string()).collect();
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);
    }
}
