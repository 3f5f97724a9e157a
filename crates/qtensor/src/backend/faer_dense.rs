//! Dense backend using faer for matrix products.
//!
//! Data is row-major, so operands are handed to faer as row-major views
//! (zero-copy) and the product is written straight into the output buffer.

use faer::linalg::matmul::matmul;
use faer::{Accum, MatMut, MatRef, Par};

use crate::backend::{Dense, Gemm};
use crate::scalar::Scalar;

/// GEMM through faer.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerGemm;

impl Gemm for FaerGemm {
    const FAMILY: &'static str = "faer";

    fn gemm<T: Scalar>(c: &mut [T], a: &[T], b: &[T], m: usize, k: usize, n: usize) {
        let a = MatRef::from_row_major_slice(a, m, k);
        let b = MatRef::from_row_major_slice(b, k, n);
        let c = MatMut::from_row_major_slice_mut(c, m, n);

        // C = 1 * A * B, overwriting C
        matmul(c, Accum::Replace, a, b, T::one(), Par::Seq);
    }
}

/// Dense storage with faer-backed GEMM.
pub type FaerBackend<T> = Dense<T, FaerGemm>;
