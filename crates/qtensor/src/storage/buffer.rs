//! Buffer with an explicit ownership mode.

use std::fmt;
use std::ptr::NonNull;

use tracing::{trace, warn};

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::strides::size_of_shape;

/// Who is responsible for freeing a tensor's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipMode {
    /// Allocated by the backend; freed on release.
    Owned,
    /// Caller-owned memory; the caller keeps it alive, nothing is freed here.
    Borrowed,
    /// Caller's allocation transferred to the tensor; freed on release.
    Taken,
}

impl fmt::Display for OwnershipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OwnershipMode::Owned => "owned",
            OwnershipMode::Borrowed => "borrowed",
            OwnershipMode::Taken => "taken",
        };
        f.write_str(name)
    }
}

/// Contiguous element storage tagged with its ownership mode.
///
/// The representation is private: a borrowed buffer can only be made
/// through [`Buffer::borrowed`], whose contract covers the raw pointer.
///
/// ```compile_fail
/// use std::ptr::NonNull;
/// use qtensor::{Buffer, c64};
///
/// let buf: Buffer<c64> = Buffer::Borrowed { ptr: NonNull::dangling(), len: 4 };
/// ```
pub struct Buffer<T: Scalar>(Repr<T>);

enum Repr<T> {
    Owned(Vec<T>),
    Borrowed { ptr: NonNull<T>, len: usize },
    Taken(Box<[T]>),
}

// Safety: a Borrowed buffer behaves like `&mut [T]` handed out by the caller,
// which is Send when T is Send.
unsafe impl<T: Scalar> Send for Buffer<T> {}
// Safety: shared access only yields `&[T]`; mutation needs `&mut Buffer`.
unsafe impl<T: Scalar> Sync for Buffer<T> {}

impl<T: Scalar> Buffer<T> {
    /// Wrap a backend allocation.
    #[inline]
    pub fn owned(data: Vec<T>) -> Self {
        Buffer(Repr::Owned(data))
    }

    /// Take over a caller allocation.
    #[inline]
    pub fn taken(data: Box<[T]>) -> Self {
        Buffer(Repr::Taken(data))
    }

    /// Attach to caller memory without copying.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads and writes of `len` elements for as long
    /// as the buffer (or any tensor holding it) is alive, and must not be
    /// accessed through other paths concurrently with accesses made here.
    #[inline]
    pub unsafe fn borrowed(ptr: NonNull<T>, len: usize) -> Self {
        Buffer(Repr::Borrowed { ptr, len })
    }

    /// Attach to a mutable slice.
    ///
    /// The returned buffer does not carry the slice's lifetime; the caller
    /// must not let it outlive `data`.
    #[inline]
    pub(crate) fn borrowed_slice(data: &mut [T]) -> Self {
        Buffer(Repr::Borrowed {
            len: data.len(),
            ptr: NonNull::from(data).cast(),
        })
    }

    /// Ownership mode of this buffer.
    pub fn mode(&self) -> OwnershipMode {
        match &self.0 {
            Repr::Owned(_) => OwnershipMode::Owned,
            Repr::Borrowed { .. } => OwnershipMode::Borrowed,
            Repr::Taken(_) => OwnershipMode::Taken,
        }
    }

    /// Number of elements in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.0 {
            Repr::Owned(v) => v.len(),
            Repr::Borrowed { len, .. } => *len,
            Repr::Taken(b) => b.len(),
        }
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get immutable slice of data.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.0 {
            Repr::Owned(v) => v.as_slice(),
            // Safety: validity guaranteed by the `borrowed` contract.
            Repr::Borrowed { ptr, len } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
            Repr::Taken(b) => &b[..],
        }
    }

    /// Get mutable slice of data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        match &mut self.0 {
            Repr::Owned(v) => v.as_mut_slice(),
            // Safety: validity guaranteed by the `borrowed` contract.
            Repr::Borrowed { ptr, len } => unsafe {
                std::slice::from_raw_parts_mut(ptr.as_ptr(), *len)
            },
            Repr::Taken(b) => &mut b[..],
        }
    }

    /// Get raw pointer (for FFI).
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.as_slice().as_ptr()
    }
}

impl<T: Scalar> Drop for Buffer<T> {
    fn drop(&mut self) {
        // Owned and Taken storage is freed by the fields' own drops.
        match &self.0 {
            Repr::Owned(v) => trace!(len = v.len(), "releasing owned buffer"),
            Repr::Taken(b) => trace!(len = b.len(), "releasing taken buffer"),
            Repr::Borrowed { len, .. } => trace!(len = *len, "detaching borrowed buffer"),
        }
    }
}

impl<T: Scalar> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("mode", &self.mode())
            .field("len", &self.len())
            .finish()
    }
}

fn zeroed_vec<T: Scalar>(shape: &[usize]) -> Result<Vec<T>, TensorError> {
    let len = size_of_shape(shape)?;

    let mut data = Vec::new();
    if let Err(err) = data.try_reserve_exact(len) {
        warn!(?shape, len, %err, "tensor allocation failed");
        return Err(TensorError::AllocationFailure {
            shape: shape.to_vec(),
            reason: err.to_string(),
        });
    }
    data.resize(len, T::zero());
    Ok(data)
}

/// Allocate a zero-initialized owned buffer for `shape`.
///
/// # Errors
///
/// `AllocationFailure` if the element count overflows or the allocator
/// refuses the request.
pub fn allocate<T: Scalar>(shape: &[usize]) -> Result<Buffer<T>, TensorError> {
    zeroed_vec(shape).map(Buffer::owned)
}

/// Allocate a zero-initialized boxed slice for `shape`, suitable for
/// [`Buffer::taken`].
///
/// # Errors
///
/// Same as [`allocate`].
pub fn allocate_boxed<T: Scalar>(shape: &[usize]) -> Result<Box<[T]>, TensorError> {
    zeroed_vec(shape).map(Vec::into_boxed_slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;

    #[test]
    fn test_allocate_zeros() {
        let buf: Buffer<c64> = allocate(&[2, 3]).unwrap();
        assert_eq!(buf.mode(), OwnershipMode::Owned);
        assert_eq!(buf.len(), 6);
        assert!(buf.as_slice().iter().all(|&z| z == c64::new(0.0, 0.0)));
    }

    #[test]
    fn test_allocate_scalar_and_empty() {
        let buf: Buffer<f64> = allocate(&[]).unwrap();
        assert_eq!(buf.len(), 1);

        let buf: Buffer<f64> = allocate(&[3, 0]).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_allocate_overflow() {
        let result: Result<Buffer<f64>, _> = allocate(&[usize::MAX, 4]);
        assert!(matches!(result, Err(TensorError::AllocationFailure { .. })));
    }

    #[test]
    fn test_allocate_too_large() {
        // Product fits in usize, but the byte size does not.
        let result: Result<Buffer<c64>, _> = allocate(&[usize::MAX / 2]);
        assert!(matches!(result, Err(TensorError::AllocationFailure { .. })));
    }

    #[test]
    fn test_taken_buffer() {
        let buf = Buffer::taken(vec![1.0, 2.0, 3.0].into_boxed_slice());
        assert_eq!(buf.mode(), OwnershipMode::Taken);
        assert_eq!(buf.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_borrowed_buffer_aliases_caller_memory() {
        let mut data = vec![1.0, 2.0, 3.0];
        {
            let mut buf = Buffer::borrowed_slice(&mut data);
            assert_eq!(buf.mode(), OwnershipMode::Borrowed);
            buf.as_mut_slice()[1] = 20.0;
        }
        // Dropping the borrowed buffer leaves the caller's memory intact.
        assert_eq!(data, vec![1.0, 20.0, 3.0]);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(OwnershipMode::Owned.to_string(), "owned");
        assert_eq!(OwnershipMode::Borrowed.to_string(), "borrowed");
        assert_eq!(OwnershipMode::Taken.to_string(), "taken");
    }

    #[test]
    fn test_allocate_boxed() {
        let data: Box<[c64]> = allocate_boxed(&[3]).unwrap();
        assert_eq!(data.len(), 3);

        let buf = Buffer::taken(data);
        assert_eq!(buf.mode(), OwnershipMode::Taken);
        assert!(buf.as_slice().iter().all(|&z| z == c64::new(0.0, 0.0)));

        let result: Result<Box<[c64]>, _> = allocate_boxed(&[usize::MAX / 2]);
        assert!(matches!(result, Err(TensorError::AllocationFailure { .. })));
    }
}
