//! N-dimensional tensor facade over a pluggable backend.
//!
//! ```text
//! Tensor<'a, T>
//! └── Box<dyn TensorImpl<T>>   selected by name through BackendRegistry<T>
//!     └── Buffer<T>            Owned | Borrowed | Taken
//! ```
//!
//! The lifetime `'a` is the lifetime of borrowed caller memory; tensors that
//! only own their data can be `Tensor<'static, T>`.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Sub};
use std::ptr::NonNull;

use crate::backend::{TensorImpl, validate_capacity};
use crate::error::TensorError;
use crate::registry::BackendRegistry;
use crate::scalar::{Scalar, c64};
use crate::storage::{Buffer, OwnershipMode};

/// A dense n-dimensional tensor whose storage and arithmetic are delegated
/// to a registered backend.
#[derive(Debug)]
pub struct Tensor<'a, T: Scalar = c64> {
    inner: Box<dyn TensorImpl<T>>,
    _borrow: PhantomData<&'a mut [T]>,
}

impl<'a, T: Scalar> Tensor<'a, T> {
    fn from_impl(inner: Box<dyn TensorImpl<T>>) -> Self {
        Self {
            inner,
            _borrow: PhantomData,
        }
    }

    /// Create a zero-filled owned tensor on the default backend.
    ///
    /// # Errors
    ///
    /// `AmbiguousBackend` / `UnknownBackend` if no default backend can be
    /// resolved, `AllocationFailure` if storage cannot be obtained.
    ///
    /// # Examples
    ///
    /// ```
    /// use qtensor::{Tensor, c64};
    ///
    /// let t: Tensor = Tensor::zeros(&[2, 3]).unwrap();
    /// assert_eq!(t.shape(), &[2, 3]);
    /// assert_eq!(t.size(), 6);
    /// assert_eq!(*t.at(&[1, 2]).unwrap(), c64::new(0.0, 0.0));
    /// ```
    pub fn zeros(shape: &[usize]) -> Result<Self, TensorError> {
        let inner = BackendRegistry::<T>::global().create_default(shape)?;
        Ok(Self::from_impl(inner))
    }

    /// Create a zero-filled owned tensor on the named backend.
    pub fn with_backend(backend: &str, shape: &[usize]) -> Result<Self, TensorError> {
        let inner = BackendRegistry::<T>::global().create(backend, shape)?;
        Ok(Self::from_impl(inner))
    }

    /// Create a tensor that takes ownership of `data`.
    ///
    /// Data is expected in row-major order and must hold at least
    /// `product(shape)` elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use qtensor::{OwnershipMode, Tensor, c64};
    ///
    /// let data = vec![
    ///     c64::new(1.0, 0.0), c64::new(0.0, 1.0),
    ///     c64::new(0.0, -1.0), c64::new(1.0, 0.0),
    /// ];
    /// let t: Tensor = Tensor::from_data(data, &[2, 2]).unwrap();
    /// assert_eq!(t.mode(), OwnershipMode::Taken);
    /// assert_eq!(*t.at(&[1, 0]).unwrap(), c64::new(0.0, -1.0));
    /// ```
    pub fn from_data(data: impl Into<Box<[T]>>, shape: &[usize]) -> Result<Self, TensorError> {
        let mut tensor = Self::zeros(&[0])?;
        tensor.take(data, shape)?;
        Ok(tensor)
    }

    /// Create an owned tensor holding a copy of `data`.
    pub fn from_slice(data: &[T], shape: &[usize]) -> Result<Self, TensorError> {
        let mut tensor = Self::zeros(&[0])?;
        tensor.copy(data, shape)?;
        Ok(tensor)
    }

    /// Create a tensor viewing `data` in place.
    ///
    /// Writes through the tensor land in `data`; nothing is freed on drop.
    pub fn borrowed(data: &'a mut [T], shape: &[usize]) -> Result<Self, TensorError> {
        let mut tensor = Self::zeros(&[0])?;
        tensor.borrow(data, shape)?;
        Ok(tensor)
    }

    /// Get the shape of the tensor.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.inner.shape()
    }

    /// Get the rank (number of dimensions).
    #[inline]
    pub fn rank(&self) -> usize {
        self.inner.shape().len()
    }

    /// Get total number of elements (1 for a rank-0 tensor).
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Ownership mode of the current buffer.
    #[inline]
    pub fn mode(&self) -> OwnershipMode {
        self.inner.mode()
    }

    /// Name of the backend holding the data.
    #[inline]
    pub fn backend(&self) -> &str {
        self.inner.name()
    }

    /// Elements in row-major order.
    #[inline]
    pub fn data(&self) -> &[T] {
        self.inner.data()
    }

    /// Elements in row-major order, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        self.inner.data_mut()
    }

    /// Element at a multi-index.
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if the index count differs from the rank or any
    /// coordinate is out of bounds.
    pub fn at(&self, indices: &[usize]) -> Result<&T, TensorError> {
        self.inner.at(indices)
    }

    /// Mutable element at a multi-index.
    pub fn at_mut(&mut self, indices: &[usize]) -> Result<&mut T, TensorError> {
        self.inner.at_mut(indices)
    }

    /// Set element by multi-index.
    pub fn set(&mut self, indices: &[usize], value: T) -> Result<(), TensorError> {
        *self.inner.at_mut(indices)? = value;
        Ok(())
    }

    /// Fill all elements with a value.
    pub fn fill(&mut self, value: T) {
        self.inner.data_mut().fill(value);
    }

    /// Replace contents with an owned copy of `data`.
    ///
    /// The previous buffer is released first if it was owned or taken.
    /// On error the tensor is unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidShape` if `data` is shorter than `product(shape)`.
    pub fn copy(&mut self, data: &[T], shape: &[usize]) -> Result<(), TensorError> {
        let size = validate_capacity(shape, data.len())?;
        let mut buffer = self.inner.allocate(shape)?;
        buffer.as_mut_slice().copy_from_slice(&data[..size]);
        self.inner.attach(buffer, shape)
    }

    /// View `data` in place instead of the current buffer.
    ///
    /// The previous buffer is released first if it was owned or taken.
    /// On error the tensor is unchanged.
    pub fn borrow(&mut self, data: &'a mut [T], shape: &[usize]) -> Result<(), TensorError> {
        validate_capacity(shape, data.len())?;
        self.inner.attach(Buffer::borrowed_slice(data), shape)
    }

    /// View foreign memory in place instead of the current buffer.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` elements until this
    /// tensor is dropped or re-pointed by another `copy`/`borrow`/`take`, and
    /// other accesses to that memory must not overlap accesses made through
    /// the tensor.
    pub unsafe fn borrow_raw(
        &mut self,
        ptr: NonNull<T>,
        len: usize,
        shape: &[usize],
    ) -> Result<(), TensorError> {
        validate_capacity(shape, len)?;
        // Safety: forwarded from this function's contract.
        let buffer = unsafe { Buffer::borrowed(ptr, len) };
        self.inner.attach(buffer, shape)
    }

    /// Take ownership of `data` instead of the current buffer.
    ///
    /// The previous buffer is released first if it was owned or taken.
    /// On error the tensor is unchanged and `data` is dropped.
    pub fn take(&mut self, data: impl Into<Box<[T]>>, shape: &[usize]) -> Result<(), TensorError> {
        let data = data.into();
        validate_capacity(shape, data.len())?;
        self.inner.attach(Buffer::taken(data), shape)
    }

    fn same_backend(&self, rhs: &Tensor<'_, T>) -> Result<(), TensorError> {
        if self.backend() != rhs.backend() {
            return Err(TensorError::BackendMismatch {
                lhs: self.backend().to_string(),
                rhs: rhs.backend().to_string(),
            });
        }
        Ok(())
    }

    /// Matrix product of two rank-2 tensors on the same backend.
    ///
    /// # Errors
    ///
    /// `BackendMismatch` if the operands use different backends,
    /// `ShapeMismatch` unless shapes are `[m, k]` and `[k, n]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use qtensor::{Tensor, c64};
    ///
    /// let one = c64::new(1.0, 0.0);
    /// let zero = c64::new(0.0, 0.0);
    /// let a: Tensor = Tensor::from_data(vec![one, zero, zero, one], &[2, 2]).unwrap();
    /// let b = a.try_clone().unwrap();
    ///
    /// let c = (&a * &b).unwrap();
    /// assert_eq!(c.data(), a.data());
    /// ```
    pub fn multiply(&self, rhs: &Tensor<'_, T>) -> Result<Tensor<'static, T>, TensorError> {
        self.same_backend(rhs)?;
        let inner = self.inner.multiply(rhs.inner.as_ref())?;
        Ok(Tensor::from_impl(inner))
    }

    /// Element-wise sum of two tensors with the same shape.
    pub fn add(&self, rhs: &Tensor<'_, T>) -> Result<Tensor<'static, T>, TensorError> {
        self.same_backend(rhs)?;
        let inner = self.inner.zip_with(rhs.inner.as_ref(), |a, b| a + b)?;
        Ok(Tensor::from_impl(inner))
    }

    /// Element-wise difference of two tensors with the same shape.
    pub fn sub(&self, rhs: &Tensor<'_, T>) -> Result<Tensor<'static, T>, TensorError> {
        self.same_backend(rhs)?;
        let inner = self.inner.zip_with(rhs.inner.as_ref(), |a, b| a - b)?;
        Ok(Tensor::from_impl(inner))
    }

    /// Multiply every element by a real factor.
    pub fn scale(&self, factor: f64) -> Result<Tensor<'static, T>, TensorError> {
        let inner = self.inner.map(&|a: T| a.scale_real(factor))?;
        Ok(Tensor::from_impl(inner))
    }

    /// Owned deep copy on the same backend.
    pub fn try_clone(&self) -> Result<Tensor<'static, T>, TensorError> {
        Ok(Tensor::from_impl(self.inner.duplicate()?))
    }

    /// Write the nested-row rendering followed by a newline.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{self}")
    }
}

impl<T: Scalar> fmt::Display for Tensor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.dump(f)
    }
}

/// Tensors compare equal when shapes and elements match, regardless of
/// backend or ownership mode.
impl<'b, T: Scalar> PartialEq<Tensor<'b, T>> for Tensor<'_, T> {
    fn eq(&self, other: &Tensor<'b, T>) -> bool {
        self.shape() == other.shape() && self.data() == other.data()
    }
}

impl<'b, T: Scalar> Mul<&Tensor<'b, T>> for &Tensor<'_, T> {
    type Output = Result<Tensor<'static, T>, TensorError>;

    fn mul(self, rhs: &Tensor<'b, T>) -> Self::Output {
        self.multiply(rhs)
    }
}

impl<'b, T: Scalar> Add<&Tensor<'b, T>> for &Tensor<'_, T> {
    type Output = Result<Tensor<'static, T>, TensorError>;

    fn add(self, rhs: &Tensor<'b, T>) -> Self::Output {
        Tensor::add(self, rhs)
    }
}

impl<'b, T: Scalar> Sub<&Tensor<'b, T>> for &Tensor<'_, T> {
    type Output = Result<Tensor<'static, T>, TensorError>;

    fn sub(self, rhs: &Tensor<'b, T>) -> Self::Output {
        Tensor::sub(self, rhs)
    }
}
