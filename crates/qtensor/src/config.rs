//! Backend selection configuration.
//!
//! The default backend for an element kind is resolved in this order:
//!
//! 1. a name pinned with [`BackendRegistry::set_default`](crate::registry::BackendRegistry::set_default)
//!    or read from the kind's environment variable (`QTENSOR_BACKEND_C64`,
//!    `QTENSOR_BACKEND_F64`) when the global registry is first used; with the
//!    `generic-backend` feature an unset variable pins the faer backend
//! 2. the only registered backend, if exactly one is registered
//!
//! Anything else is `AmbiguousBackend`.

use std::env;

use tracing::debug;

use crate::scalar::Scalar;

/// Backend selection settings for one element kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Explicit default backend name.
    pub default_backend: Option<String>,
}

impl BackendConfig {
    /// Read settings for element kind `T` from the environment.
    ///
    /// Unset or blank variables leave the default unconfigured.
    pub fn from_env<T: Scalar>() -> Self {
        Self::from_lookup(T::BACKEND_ENV, |key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_backend = lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        if let Some(name) = &default_backend {
            debug!(key, backend = %name, "default backend configured");
        }

        Self { default_backend }
    }
}
