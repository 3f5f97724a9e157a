//! Name-to-factory table for backends.
//!
//! Every element kind has one process-wide registry, reached through
//! [`Scalar::registry`]. It is created on first use and populated by the
//! built-in backends' self-registration at that moment, so lookups never
//! observe a partially registered table. Additional registrations are allowed
//! afterwards but are meant to happen before concurrent use begins.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::backend::{BackendFactory, FaerBackend, TensorImpl};
use crate::config::BackendConfig;
use crate::error::TensorError;
use crate::scalar::Scalar;

/// Registry of backend factories for element type `T`.
pub struct BackendRegistry<T: Scalar> {
    factories: RwLock<BTreeMap<String, BackendFactory<T>>>,
    default: RwLock<Option<String>>,
}

impl<T: Scalar> BackendRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(BTreeMap::new()),
            default: RwLock::new(None),
        }
    }

    /// Create a registry holding the built-in backends, configured from the
    /// environment.
    pub fn with_builtin() -> Self {
        let registry = Self::new();
        registry.register_builtin();

        #[allow(unused_mut)]
        let mut config = BackendConfig::from_env::<T>();
        // With several built-ins, faer stays the default unless configured.
        #[cfg(feature = "generic-backend")]
        config
            .default_backend
            .get_or_insert_with(|| crate::backend::backend_name::<T>(FaerBackend::<T>::FAMILY));

        registry.configure(config);
        registry
    }

    /// The process-wide registry for `T`.
    pub fn global() -> &'static Self {
        T::registry()
    }

    fn register_builtin(&self) {
        if let Err(err) = FaerBackend::<T>::register(self) {
            warn!(%err, "built-in backend registration failed");
        }
        #[cfg(feature = "generic-backend")]
        if let Err(err) = crate::backend::GenericBackend::<T>::register(self) {
            warn!(%err, "built-in backend registration failed");
        }
    }

    fn factories(&self) -> RwLockReadGuard<'_, BTreeMap<String, BackendFactory<T>>> {
        self.factories.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn factories_mut(&self) -> RwLockWriteGuard<'_, BTreeMap<String, BackendFactory<T>>> {
        self.factories.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply selection settings.
    pub fn configure(&self, config: BackendConfig) {
        *self.default.write().unwrap_or_else(PoisonError::into_inner) = config.default_backend;
    }

    /// Register a backend factory under `name`.
    ///
    /// # Errors
    ///
    /// `DuplicateBackend` if `name` is already registered.
    pub fn register(
        &self,
        name: impl Into<String>,
        factory: BackendFactory<T>,
    ) -> Result<(), TensorError> {
        let name = name.into();
        let mut factories = self.factories_mut();

        if factories.contains_key(&name) {
            return Err(TensorError::DuplicateBackend { name });
        }

        debug!(backend = %name, kind = T::KIND, "registered backend");
        factories.insert(name, factory);
        Ok(())
    }

    /// All registered backend names, sorted.
    pub fn registered(&self) -> Vec<String> {
        self.factories().keys().cloned().collect()
    }

    /// Check whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories().contains_key(name)
    }

    /// Create a zero-filled owned instance of backend `name`.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` if `name` is not registered; allocation errors from
    /// the backend.
    pub fn create(&self, name: &str, shape: &[usize]) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        let factory = self.factories().get(name).copied();
        let factory = factory.ok_or_else(|| self.unknown(name))?;

        trace!(backend = name, ?shape, "creating backend instance");
        factory(shape)
    }

    /// Pin the default backend.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` if `name` is not registered.
    pub fn set_default(&self, name: &str) -> Result<(), TensorError> {
        if !self.contains(name) {
            return Err(self.unknown(name));
        }
        debug!(backend = name, kind = T::KIND, "default backend pinned");
        *self.default.write().unwrap_or_else(PoisonError::into_inner) = Some(name.to_string());
        Ok(())
    }

    /// Name of the backend used when none is given explicitly.
    ///
    /// # Errors
    ///
    /// `UnknownBackend` if a configured default is not registered,
    /// `AmbiguousBackend` if nothing is configured and the number of
    /// registered backends is not exactly one.
    pub fn default_backend(&self) -> Result<String, TensorError> {
        let configured = self
            .default
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(name) = configured {
            return if self.contains(&name) {
                Ok(name)
            } else {
                Err(self.unknown(&name))
            };
        }

        let factories = self.factories();
        match factories.keys().next() {
            Some(name) if factories.len() == 1 => Ok(name.clone()),
            _ => Err(TensorError::AmbiguousBackend {
                registered: factories.keys().cloned().collect(),
            }),
        }
    }

    /// Create a zero-filled owned instance of the default backend.
    pub fn create_default(&self, shape: &[usize]) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        let name = self.default_backend()?;
        self.create(&name, shape)
    }

    fn unknown(&self, name: &str) -> TensorError {
        TensorError::UnknownBackend {
            name: name.to_string(),
            registered: self.registered(),
        }
    }
}

impl<T: Scalar> Default for BackendRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GenericBackend;
    use crate::scalar::c64;

    #[test]
    fn test_register_and_enumerate() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        assert!(registry.registered().is_empty());

        FaerBackend::register(&registry).unwrap();
        GenericBackend::register(&registry).unwrap();

        assert_eq!(
            registry.registered(),
            vec!["faer<complex<f64>>", "generic<complex<f64>>"]
        );
    }

    #[test]
    fn test_duplicate() {
        let registry: BackendRegistry<f64> = BackendRegistry::new();
        FaerBackend::register(&registry).unwrap();
        assert_eq!(
            FaerBackend::register(&registry),
            Err(TensorError::DuplicateBackend {
                name: "faer<f64>".to_string()
            })
        );
        assert_eq!(registry.registered().len(), 1);
    }

    #[test]
    fn test_create_unknown() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        FaerBackend::register(&registry).unwrap();
        match registry.create("cuda<complex<f64>>", &[2]) {
            Err(TensorError::UnknownBackend { name, registered }) => {
                assert_eq!(name, "cuda<complex<f64>>");
                assert_eq!(registered, vec!["faer<complex<f64>>"]);
            }
            other => panic!("expected UnknownBackend, got {other:?}"),
        }
    }

    #[test]
    fn test_create() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        GenericBackend::register(&registry).unwrap();
        let t = registry.create("generic<complex<f64>>", &[2, 2]).unwrap();
        assert_eq!(t.name(), "generic<complex<f64>>");
        assert_eq!(t.shape(), &[2, 2]);
    }

    #[test]
    fn test_default_single() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        FaerBackend::register(&registry).unwrap();
        assert_eq!(registry.default_backend().unwrap(), "faer<complex<f64>>");
    }

    #[test]
    fn test_default_requires_disambiguation() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        assert!(matches!(
            registry.default_backend(),
            Err(TensorError::AmbiguousBackend { .. })
        ));

        FaerBackend::register(&registry).unwrap();
        GenericBackend::register(&registry).unwrap();
        assert!(matches!(
            registry.default_backend(),
            Err(TensorError::AmbiguousBackend { registered }) if registered.len() == 2
        ));

        registry.set_default("generic<complex<f64>>").unwrap();
        assert_eq!(registry.default_backend().unwrap(), "generic<complex<f64>>");
        let t = registry.create_default(&[3]).unwrap();
        assert_eq!(t.name(), "generic<complex<f64>>");
    }

    #[test]
    fn test_set_default_unknown() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        assert!(matches!(
            registry.set_default("faer<complex<f64>>"),
            Err(TensorError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn test_configured_default_unknown_surfaces_at_use() {
        let registry: BackendRegistry<c64> = BackendRegistry::new();
        FaerBackend::register(&registry).unwrap();
        registry.configure(BackendConfig {
            default_backend: Some("metal<complex<f64>>".to_string()),
        });
        assert!(matches!(
            registry.create_default(&[2]),
            Err(TensorError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn test_global_registry_has_builtin() {
        let names = BackendRegistry::<c64>::global().registered();
        assert!(names.contains(&"faer<complex<f64>>".to_string()));
        let names = BackendRegistry::<f64>::global().registered();
        assert!(names.contains(&"faer<f64>".to_string()));
    }
}
