//! Dense row-major storage shared by the built-in backends.

use std::fmt;
use std::marker::PhantomData;

use tracing::trace;

use crate::backend::{Shape, TensorImpl, backend_name, matmul_dims, validate_capacity};
use crate::error::TensorError;
use crate::registry::BackendRegistry;
use crate::scalar::Scalar;
use crate::storage::{Buffer, allocate};

/// Matrix-product kernel over row-major slices.
pub trait Gemm: fmt::Debug + Send + Sync + 'static {
    /// Family part of the registered backend name.
    const FAMILY: &'static str;

    /// `c = a * b` for `a: [m, k]`, `b: [k, n]`, `c: [m, n]`, all row-major.
    fn gemm<T: Scalar>(c: &mut [T], a: &[T], b: &[T], m: usize, k: usize, n: usize);
}

/// Dense row-major backend; `G` supplies the matrix product.
///
/// The buffer is private and only replaced through `attach`, which checks
/// capacity, so the shape always fits the buffer:
///
/// ```compile_fail
/// use qtensor::backend::{FaerBackend, TensorImpl};
/// use qtensor::Buffer;
///
/// let mut t: FaerBackend<f64> = FaerBackend::zeros(&[2, 2]).unwrap();
/// *t.buffer_mut() = Buffer::owned(vec![]);
/// ```
#[derive(Debug)]
pub struct Dense<T: Scalar, G: Gemm> {
    name: String,
    shape: Shape,
    buffer: Buffer<T>,
    _gemm: PhantomData<G>,
}

impl<T: Scalar, G: Gemm> Dense<T, G> {
    /// Family part of the registered name.
    pub const FAMILY: &'static str = G::FAMILY;

    /// Zero-filled owned instance.
    pub fn zeros(shape: &[usize]) -> Result<Self, TensorError> {
        Self::with_buffer(allocate(shape)?, shape)
    }

    /// Instance around an existing buffer.
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `buffer` is smaller than `shape` requires.
    pub fn with_buffer(buffer: Buffer<T>, shape: &[usize]) -> Result<Self, TensorError> {
        validate_capacity(shape, buffer.len())?;
        Ok(Self {
            name: backend_name::<T>(G::FAMILY),
            shape: Shape::from_slice(shape),
            buffer,
            _gemm: PhantomData,
        })
    }

    /// Registry factory.
    pub fn create(shape: &[usize]) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        Ok(Box::new(Self::zeros(shape)?))
    }

    /// Register this backend under `<FAMILY><KIND>`.
    pub fn register(registry: &BackendRegistry<T>) -> Result<(), TensorError> {
        registry.register(backend_name::<T>(G::FAMILY), Self::create)
    }
}

impl<T: Scalar, G: Gemm> TensorImpl<T> for Dense<T, G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn buffer(&self) -> &Buffer<T> {
        &self.buffer
    }

    fn data_mut(&mut self) -> &mut [T] {
        let size = self.size();
        &mut self.buffer.as_mut_slice()[..size]
    }

    fn attach(&mut self, buffer: Buffer<T>, shape: &[usize]) -> Result<(), TensorError> {
        validate_capacity(shape, buffer.len())?;
        trace!(
            backend = %self.name,
            from = %self.buffer.mode(),
            to = %buffer.mode(),
            ?shape,
            "attaching buffer"
        );
        // Dropping the previous buffer releases it per its mode.
        self.buffer = buffer;
        self.shape = Shape::from_slice(shape);
        Ok(())
    }

    fn instantiate(
        &self,
        buffer: Buffer<T>,
        shape: &[usize],
    ) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        Ok(Box::new(Self::with_buffer(buffer, shape)?))
    }

    fn multiply(&self, rhs: &dyn TensorImpl<T>) -> Result<Box<dyn TensorImpl<T>>, TensorError> {
        let (m, k, n) = matmul_dims(self.shape(), rhs.shape())?;
        trace!(backend = %self.name, m, k, n, "gemm");

        let mut out = self.allocate(&[m, n])?;
        G::gemm(out.as_mut_slice(), self.data(), rhs.data(), m, k, n);
        self.instantiate(out, &[m, n])
    }
}
