//! Scalar trait for tensor element types.

use faer_traits::ComplexField;
use std::fmt::{self, Debug};
use std::ops::{Add, Mul, Sub};
use std::sync::OnceLock;

use crate::registry::BackendRegistry;

pub use faer::c64;

/// Trait for element types a backend can store.
///
/// Each element kind owns one process-wide [`BackendRegistry`], so backends
/// are registered and looked up per kind.
pub trait Scalar:
    ComplexField
    + Copy
    + Debug
    + Default
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Element kind, used as the suffix of backend names (`faer<KIND>`).
    const KIND: &'static str;

    /// Environment variable naming the default backend for this kind.
    const BACKEND_ENV: &'static str;

    /// Returns the additive identity (zero).
    fn zero() -> Self {
        Self::default()
    }

    /// Returns the multiplicative identity (one).
    fn one() -> Self;

    /// Multiply by a real factor.
    fn scale_real(self, factor: f64) -> Self;

    /// Write the element the way `dump` renders it.
    fn write_element(&self, out: &mut dyn fmt::Write) -> fmt::Result;

    /// The process-wide registry for this element kind.
    fn registry() -> &'static BackendRegistry<Self>;
}

impl Scalar for f64 {
    const KIND: &'static str = "f64";
    const BACKEND_ENV: &'static str = "QTENSOR_BACKEND_F64";

    fn one() -> Self {
        1.0
    }

    fn scale_real(self, factor: f64) -> Self {
        self * factor
    }

    fn write_element(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{self}")
    }

    fn registry() -> &'static BackendRegistry<Self> {
        static REGISTRY: OnceLock<BackendRegistry<f64>> = OnceLock::new();
        REGISTRY.get_or_init(BackendRegistry::with_builtin)
    }
}

impl Scalar for c64 {
    const KIND: &'static str = "complex<f64>";
    const BACKEND_ENV: &'static str = "QTENSOR_BACKEND_C64";

    fn one() -> Self {
        c64::new(1.0, 0.0)
    }

    fn scale_real(self, factor: f64) -> Self {
        c64::new(self.re * factor, self.im * factor)
    }

    fn write_element(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "({},{})", self.re, self.im)
    }

    fn registry() -> &'static BackendRegistry<Self> {
        static REGISTRY: OnceLock<BackendRegistry<c64>> = OnceLock::new();
        REGISTRY.get_or_init(BackendRegistry::with_builtin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer_traits::ComplexField;

    #[test]
    fn test_c64_is_not_real() {
        assert!(!<c64 as ComplexField>::IS_REAL);
        assert!(<f64 as ComplexField>::IS_REAL);
    }

    #[test]
    fn test_zero_one() {
        assert_eq!(f64::zero(), 0.0);
        assert_eq!(f64::one(), 1.0);
        assert_eq!(c64::zero(), c64::new(0.0, 0.0));
        assert_eq!(c64::one(), c64::new(1.0, 0.0));
    }

    #[test]
    fn test_write_element() {
        let mut s = String::new();
        c64::new(0.0, -1.0).write_element(&mut s).unwrap();
        assert_eq!(s, "(0,-1)");

        let mut s = String::new();
        2.5f64.write_element(&mut s).unwrap();
        assert_eq!(s, "2.5");
    }

    #[test]
    fn test_scale_real() {
        assert_eq!(c64::new(1.0, -2.0).scale_real(2.0), c64::new(2.0, -4.0));
    }
}
