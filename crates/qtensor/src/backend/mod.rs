//! Backend abstraction for tensor storage and arithmetic.
//!
//! A backend instance holds one [`Buffer`] plus the shape that describes it,
//! and implements arithmetic for its element type. Backends are looked up by
//! name in a [`BackendRegistry`](crate::registry::BackendRegistry).
//!
//! # Backends
//!
//! Both built-ins are [`Dense`] row-major storage and differ only in their
//! [`Gemm`] kernel:
//!
//! - `FaerBackend`: GEMM through faer (always registered)
//! - `GenericBackend`: naive loops (registered with the `generic-backend`
//!   feature)

mod dense;
mod dump;
mod faer_dense;
mod generic;

use std::fmt;

use smallvec::SmallVec;
use tracing::trace;

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::storage::{Buffer, OwnershipMode, allocate};
use crate::strides::{offset, size_of_shape};

pub use dense::{Dense, Gemm};
pub use dump::dump_rows;
pub use faer_dense::{FaerBackend, FaerGemm};
pub use generic::{GenericBackend, LoopGemm};

/// Inline storage for shapes; most tensors here have rank <= 4.
pub type Shape = SmallVec<[usize; 4]>;

/// Constructor stored in the registry: builds a zero-filled, owned instance.
pub type BackendFactory<T> = fn(&[usize]) -> Result<Box<dyn TensorImpl<T>>, TensorError>;

/// Storage and arithmetic engine for one element type.
///
/// Implementors provide storage access, attaching, and matrix multiply; the
/// addressing rule, element-wise ops and dumping come as provided methods so
/// every backend agrees on them.
pub trait TensorImpl<T: Scalar>: fmt::Debug + Send + Sync {
    /// Registered name of this backend.
    fn name(&self) -> &str;

    /// Current shape.
    fn shape(&self) -> &[usize];

    /// The attached buffer.
    fn buffer(&self) -> &Buffer<T>;

    /// The addressable elements in row-major order, mutably.
    ///
    /// The buffer itself is only replaced through [`attach`](Self::attach).
    fn data_mut(&mut self) -> &mut [T];

    /// Replace buffer and shape together.
    ///
    /// The previous buffer is released according to its ownership mode.
    /// On error nothing changes (the rejected buffer is dropped).
    fn attach(&mut self, buffer: Buffer<T>, shape: &[usize]) -> Result<(), TensorError>;

    /// New instance of the same backend around `buffer`.
    fn instantiate(
        &self,
        buffer: Buffer<T>,
        shape: &[usize],
    ) -> Result<Box<dyn TensorImpl<T>>, TensorError>;

    /// Matrix product of two rank-2 instances.
    fn multiply(&self, rhs: &dyn TensorImpl<T>) -> Result<Box<dyn TensorImpl<T>>, TensorError>;

    /// Zero-initialized owned buffer for `shape`.
    fn allocate(&self, shape: &[usize]) -> Result<Buffer<T>, TensorError> {
        allocate(shape)
    }

    /// Number of addressable elements.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Ownership mode of the attached buffer.
    fn mode(&self) -> OwnershipMode {
        self.buffer().mode()
    }

    /// The addressable elements in row-major order.
    fn data(&self) -> &[T] {
        let size = self.size();
        self.buffer().as_slice().get(..size).unwrap_or_default()
    }

    /// Element at a multi-index.
    fn at(&self, indices: &[usize]) -> Result<&T, TensorError> {
        let linear = offset(self.shape(), indices)?;
        self.data()
            .get(linear)
            .ok_or_else(|| out_of_range(self.shape(), indices))
    }

    /// Mutable element at a multi-index.
    fn at_mut(&mut self, indices: &[usize]) -> Result<&mut T, TensorError> {
        let linear = offset(self.shape(), indices)?;
        if linear >= self.data().len() {
            return Err(out_of_range(self.shape(), indices));
        }
        Ok(&mut self.data_mut()[linear])
    }

    /// Element-wise combination of two instances with the same shape.
    fn zip_with(
        &self,
        rhs: &dyn TensorImpl<T>,
        op: fn(T, T) -> T,
    ) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        if self.shape() != rhs.shape() {
            return Err(TensorError::ShapeMismatch {
                lhs: self.shape().to_vec(),
                rhs: rhs.shape().to_vec(),
            });
        }
        trace!(backend = self.name(), shape = ?self.shape(), "element-wise op");

        let mut out = self.allocate(self.shape())?;
        for ((dst, &a), &b) in out
            .as_mut_slice()
            .iter_mut()
            .zip(self.data())
            .zip(rhs.data())
        {
            *dst = op(a, b);
        }
        self.instantiate(out, self.shape())
    }

    /// Element-wise map into a new owned instance.
    fn map(&self, op: &dyn Fn(T) -> T) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        let mut out = self.allocate(self.shape())?;
        for (dst, &a) in out.as_mut_slice().iter_mut().zip(self.data()) {
            *dst = op(a);
        }
        self.instantiate(out, self.shape())
    }

    /// Deep copy into a new owned instance.
    fn duplicate(&self) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        self.map(&|a| a)
    }

    /// Render nested bracketed rows.
    fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        dump_rows(self.shape(), self.data(), out)
    }
}

fn out_of_range(shape: &[usize], indices: &[usize]) -> TensorError {
    TensorError::IndexOutOfRange {
        indices: indices.to_vec(),
        shape: shape.to_vec(),
    }
}

/// Check that `buffer` can back `shape`.
///
/// # Errors
///
/// `InvalidShape` if the buffer holds fewer than `product(shape)` elements,
/// `AllocationFailure` if the product overflows.
pub fn validate_capacity(shape: &[usize], available: usize) -> Result<usize, TensorError> {
    let required = size_of_shape(shape)?;
    if available < required {
        return Err(TensorError::InvalidShape {
            shape: shape.to_vec(),
            required,
            actual: available,
        });
    }
    Ok(required)
}

/// Dimensions `(m, k, n)` of a matrix product `[m, k] x [k, n]`.
///
/// # Errors
///
/// `ShapeMismatch` unless both operands are rank 2 with matching inner
/// dimension.
pub fn matmul_dims(lhs: &[usize], rhs: &[usize]) -> Result<(usize, usize, usize), TensorError> {
    match (lhs, rhs) {
        (&[m, k], &[k2, n]) if k == k2 => Ok((m, k, n)),
        _ => Err(TensorError::ShapeMismatch {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }),
    }
}

/// Backend name for a family and element kind, e.g. `faer<complex<f64>>`.
pub fn backend_name<T: Scalar>(family: &str) -> String {
    format!("{family}<{}>", T::KIND)
}
