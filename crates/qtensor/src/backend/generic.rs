//! Generic (naive loop-based) backend implementation.

use crate::backend::{Dense, Gemm};
use crate::scalar::Scalar;

/// Triple-loop GEMM.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopGemm;

impl Gemm for LoopGemm {
    const FAMILY: &'static str = "generic";

    fn gemm<T: Scalar>(c: &mut [T], a: &[T], b: &[T], m: usize, k: usize, n: usize) {
        for i in 0..m {
            for j in 0..n {
                let mut sum = T::zero();
                for l in 0..k {
                    sum = sum + a[i * k + l] * b[l * n + j];
                }
                c[i * n + j] = sum;
            }
        }
    }
}

/// Generic backend using naive loop-based implementations.
///
/// Serves as a reference for other backends and for debugging; only
/// self-registered with the `generic-backend` feature.
pub type GenericBackend<T> = Dense<T, LoopGemm>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FaerBackend, TensorImpl};
    use crate::storage::Buffer;
    use crate::scalar::c64;
    use approx::assert_relative_eq;

    #[test]
    fn test_generic_matches_faer() {
        let data: Vec<c64> = (0..12)
            .map(|x| c64::new(x as f64, (x % 3) as f64 - 1.0))
            .collect();

        let a = GenericBackend::with_buffer(Buffer::owned(data.clone()), &[3, 4]).unwrap();
        let b = GenericBackend::with_buffer(Buffer::owned(data.clone()), &[4, 3]).unwrap();
        let fa = FaerBackend::with_buffer(Buffer::owned(data.clone()), &[3, 4]).unwrap();
        let fb = FaerBackend::with_buffer(Buffer::owned(data), &[4, 3]).unwrap();

        let c = a.multiply(&b).unwrap();
        let fc = fa.multiply(&fb).unwrap();

        assert_eq!(c.name(), "generic<complex<f64>>");
        assert_eq!(c.shape(), fc.shape());
        for (x, y) in c.data().iter().zip(fc.data()) {
            assert_relative_eq!(x.re, y.re, epsilon = 1e-10);
            assert_relative_eq!(x.im, y.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_generic_identity() {
        let id = GenericBackend::with_buffer(Buffer::owned(vec![1.0, 0.0, 0.0, 1.0]), &[2, 2])
            .unwrap();
        let m = GenericBackend::with_buffer(Buffer::owned(vec![1.0, 2.0, 3.0, 4.0]), &[2, 2])
            .unwrap();
        let c = m.multiply(&id).unwrap();
        assert_eq!(c.data(), m.data());
    }
}
