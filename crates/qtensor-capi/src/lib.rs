//! C API for qtensor
//!
//! This crate exposes complex (`c64`) tensors to C and other languages through
//! an opaque `qt_tensor` handle. Complex elements cross the boundary as
//! interleaved `(re, im)` doubles, so a buffer of `len` elements holds
//! `2 * len` doubles.
//!
//! All extern "C" functions work with raw pointers from foreign code. Every
//! entry point catches panics and reports them as `QT_INTERNAL_ERROR` instead
//! of unwinding into the caller.

#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(non_camel_case_types)]

use libc::{c_char, c_double, c_int, size_t};
use qtensor::storage::allocate_boxed;
use qtensor::{BackendRegistry, Tensor, TensorError, c64};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr::{self, NonNull};

// Status codes
pub type StatusCode = c_int;

pub const QT_SUCCESS: StatusCode = 0;
pub const QT_INVALID_ARGUMENT: StatusCode = -1;
pub const QT_INVALID_SHAPE: StatusCode = -2;
pub const QT_INDEX_OUT_OF_RANGE: StatusCode = -3;
pub const QT_SHAPE_MISMATCH: StatusCode = -4;
pub const QT_BACKEND_MISMATCH: StatusCode = -5;
pub const QT_UNKNOWN_BACKEND: StatusCode = -6;
pub const QT_DUPLICATE_BACKEND: StatusCode = -7;
pub const QT_AMBIGUOUS_BACKEND: StatusCode = -8;
pub const QT_ALLOCATION_FAILURE: StatusCode = -9;
pub const QT_BUFFER_TOO_SMALL: StatusCode = -10;
pub const QT_INTERNAL_ERROR: StatusCode = -11;

fn status_of(err: &TensorError) -> StatusCode {
    match err {
        TensorError::InvalidShape { .. } => QT_INVALID_SHAPE,
        TensorError::IndexOutOfRange { .. } => QT_INDEX_OUT_OF_RANGE,
        TensorError::ShapeMismatch { .. } => QT_SHAPE_MISMATCH,
        TensorError::BackendMismatch { .. } => QT_BACKEND_MISMATCH,
        TensorError::UnknownBackend { .. } => QT_UNKNOWN_BACKEND,
        TensorError::DuplicateBackend { .. } => QT_DUPLICATE_BACKEND,
        TensorError::AmbiguousBackend { .. } => QT_AMBIGUOUS_BACKEND,
        TensorError::AllocationFailure { .. } => QT_ALLOCATION_FAILURE,
    }
}

/// Opaque complex tensor handle.
pub struct qt_tensor {
    inner: Tensor<'static, c64>,
}

impl qt_tensor {
    fn into_raw(tensor: Tensor<'static, c64>) -> *mut qt_tensor {
        Box::into_raw(Box::new(qt_tensor { inner: tensor }))
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

/// View a `(ptr, len)` pair as a slice; `len == 0` accepts a null pointer.
unsafe fn slice_arg<'a, T>(ptr: *const T, len: size_t) -> Option<&'a [T]> {
    if len == 0 {
        Some(<&[T]>::default())
    } else if ptr.is_null() {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts(ptr, len) })
    }
}

/// View `len` interleaved complex elements.
unsafe fn complex_arg<'a>(data: *const c_double, len: size_t) -> Option<&'a [c64]> {
    // c64 is repr(C) { re, im }.
    unsafe { slice_arg(data as *const c64, len) }
}

/// Run `f`, mapping errors and panics to status codes.
fn guard(f: impl FnOnce() -> Result<(), TensorError>) -> StatusCode {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => QT_SUCCESS,
        Ok(Err(err)) => status_of(&err),
        Err(_) => QT_INTERNAL_ERROR,
    }
}

/// Run a constructor, storing the status and returning a handle or null.
fn construct(
    status: *mut StatusCode,
    f: impl FnOnce() -> Result<Tensor<'static, c64>, TensorError>,
) -> *mut qt_tensor {
    if status.is_null() {
        return ptr::null_mut();
    }

    let (handle, code) = match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(tensor)) => (qt_tensor::into_raw(tensor), QT_SUCCESS),
        Ok(Err(err)) => (ptr::null_mut(), status_of(&err)),
        Err(_) => (ptr::null_mut(), QT_INTERNAL_ERROR),
    };
    unsafe {
        *status = code;
    }
    handle
}

/// Copy `text` plus a NUL terminator into `buf`.
///
/// `*written` receives the text length (without NUL) even when `buf` is too
/// small, so callers can size a second attempt.
fn write_text(text: &str, buf: *mut c_char, cap: size_t, written: *mut size_t) -> StatusCode {
    if !written.is_null() {
        unsafe {
            *written = text.len();
        }
    }
    if buf.is_null() || cap < text.len() + 1 {
        return QT_BUFFER_TOO_SMALL;
    }
    unsafe {
        ptr::copy_nonoverlapping(text.as_ptr() as *const c_char, buf, text.len());
        *buf.add(text.len()) = 0;
    }
    QT_SUCCESS
}

// ============================================================================
// Tensor creation functions
// ============================================================================

/// Create a new zero-filled tensor on the default backend.
///
/// # Arguments
/// * `shape` - Pointer to array of dimensions (may be null when `ndim == 0`)
/// * `ndim` - Number of dimensions
/// * `status` - Pointer to receive status code
///
/// # Returns
/// Pointer to new tensor, or null on error
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_zeros(
    shape: *const size_t,
    ndim: size_t,
    status: *mut StatusCode,
) -> *mut qt_tensor {
    let Some(shape) = (unsafe { slice_arg(shape, ndim) }) else {
        return invalid(status);
    };
    construct(status, || Tensor::zeros(shape))
}

/// Create a new tensor holding a copy of `len` complex elements.
///
/// # Arguments
/// * `data` - Interleaved `(re, im)` pairs in row-major order
/// * `len` - Number of complex elements in `data`
/// * `shape` - Pointer to array of dimensions
/// * `ndim` - Number of dimensions
/// * `status` - Pointer to receive status code
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_from_data(
    data: *const c_double,
    len: size_t,
    shape: *const size_t,
    ndim: size_t,
    status: *mut StatusCode,
) -> *mut qt_tensor {
    let (Some(data), Some(shape)) = (unsafe { complex_arg(data, len) }, unsafe {
        slice_arg(shape, ndim)
    }) else {
        return invalid(status);
    };
    construct(status, || Tensor::from_slice(data, shape))
}

fn invalid(status: *mut StatusCode) -> *mut qt_tensor {
    if !status.is_null() {
        unsafe {
            *status = QT_INVALID_ARGUMENT;
        }
    }
    ptr::null_mut()
}

// ============================================================================
// Buffers eligible for take
// ============================================================================

/// Allocate a zero-filled buffer of `len` complex elements (`2 * len` doubles).
///
/// The buffer may be handed to `qt_tensor_take` or released with
/// `qt_buffer_free`; it must not be freed with `free()`. Returns null if the
/// allocation fails.
#[unsafe(no_mangle)]
pub extern "C" fn qt_buffer_alloc(len: size_t) -> *mut c_double {
    let result = catch_unwind(|| match allocate_boxed::<c64>(&[len]) {
        Ok(buffer) => Box::into_raw(buffer) as *mut c64 as *mut c_double,
        Err(_) => ptr::null_mut(),
    });
    result.unwrap_or(ptr::null_mut())
}

/// Free a buffer from `qt_buffer_alloc` that was not taken by a tensor.
#[unsafe(no_mangle)]
pub extern "C" fn qt_buffer_free(data: *mut c_double, len: size_t) {
    if !data.is_null() {
        unsafe {
            let _ = Box::from_raw(ptr::slice_from_raw_parts_mut(data as *mut c64, len));
        }
    }
}

// ============================================================================
// Re-pointing: copy / borrow / take
// ============================================================================

/// Replace the tensor's contents with a copy of `len` complex elements.
///
/// On error the tensor is unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_copy(
    tensor: *mut qt_tensor,
    data: *const c_double,
    len: size_t,
    shape: *const size_t,
    ndim: size_t,
) -> StatusCode {
    let (Some(tensor), Some(data), Some(shape)) = (
        unsafe { tensor.as_mut() },
        unsafe { complex_arg(data, len) },
        unsafe { slice_arg(shape, ndim) },
    ) else {
        return QT_INVALID_ARGUMENT;
    };
    guard(|| tensor.inner.copy(data, shape))
}

/// View caller memory in place.
///
/// `data` must stay valid until the tensor is released or re-pointed; it is
/// never freed by the tensor. On error the tensor is unchanged.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_borrow(
    tensor: *mut qt_tensor,
    data: *mut c_double,
    len: size_t,
    shape: *const size_t,
    ndim: size_t,
) -> StatusCode {
    let (Some(tensor), Some(data), Some(shape)) = (
        unsafe { tensor.as_mut() },
        NonNull::new(data as *mut c64),
        unsafe { slice_arg(shape, ndim) },
    ) else {
        return QT_INVALID_ARGUMENT;
    };
    guard(|| unsafe { tensor.inner.borrow_raw(data, len, shape) })
}

/// Transfer a `qt_buffer_alloc` buffer of `len` complex elements to the tensor.
///
/// Once the arguments are accepted the buffer belongs to the library: it is
/// freed when the tensor releases it, or immediately if the shape does not
/// fit. On `QT_INVALID_ARGUMENT` the caller still owns it.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_take(
    tensor: *mut qt_tensor,
    data: *mut c_double,
    len: size_t,
    shape: *const size_t,
    ndim: size_t,
) -> StatusCode {
    let (Some(tensor), Some(shape)) = (unsafe { tensor.as_mut() }, unsafe {
        slice_arg(shape, ndim)
    }) else {
        return QT_INVALID_ARGUMENT;
    };
    if data.is_null() {
        return QT_INVALID_ARGUMENT;
    }

    let buffer: Box<[c64]> =
        unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data as *mut c64, len)) };
    guard(move || tensor.inner.take(buffer, shape))
}

// ============================================================================
// Tensor lifecycle functions
// ============================================================================

/// Release a tensor, freeing its buffer if owned or taken.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_release(tensor: *mut qt_tensor) {
    if !tensor.is_null() {
        unsafe {
            let _ = Box::from_raw(tensor);
        }
    }
}

// ============================================================================
// Tensor property functions
// ============================================================================

/// Get the number of dimensions (0 for a null handle).
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_rank(tensor: *const qt_tensor) -> size_t {
    unsafe { tensor.as_ref() }.map_or(0, |t| t.inner.rank())
}

/// Get the total number of elements (0 for a null handle).
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_size(tensor: *const qt_tensor) -> size_t {
    unsafe { tensor.as_ref() }.map_or(0, |t| t.inner.size())
}

/// Copy the shape into `out_shape`, which must hold `qt_tensor_rank` entries.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_shape(tensor: *const qt_tensor, out_shape: *mut size_t) -> StatusCode {
    let Some(tensor) = (unsafe { tensor.as_ref() }) else {
        return QT_INVALID_ARGUMENT;
    };
    let shape = tensor.inner.shape();
    if shape.is_empty() {
        return QT_SUCCESS;
    }
    if out_shape.is_null() {
        return QT_INVALID_ARGUMENT;
    }
    unsafe {
        ptr::copy_nonoverlapping(shape.as_ptr(), out_shape, shape.len());
    }
    QT_SUCCESS
}

/// Name of the backend holding the tensor, NUL-terminated.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_backend(
    tensor: *const qt_tensor,
    buf: *mut c_char,
    cap: size_t,
    written: *mut size_t,
) -> StatusCode {
    let Some(tensor) = (unsafe { tensor.as_ref() }) else {
        return QT_INVALID_ARGUMENT;
    };
    write_text(tensor.inner.backend(), buf, cap, written)
}

// ============================================================================
// Element access
// ============================================================================

/// Read the element at a multi-index.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_get(
    tensor: *const qt_tensor,
    indices: *const size_t,
    nidx: size_t,
    out_re: *mut c_double,
    out_im: *mut c_double,
) -> StatusCode {
    let (Some(tensor), Some(indices)) = (unsafe { tensor.as_ref() }, unsafe {
        slice_arg(indices, nidx)
    }) else {
        return QT_INVALID_ARGUMENT;
    };
    if out_re.is_null() || out_im.is_null() {
        return QT_INVALID_ARGUMENT;
    }

    guard(|| {
        let z = *tensor.inner.at(indices)?;
        unsafe {
            *out_re = z.re;
            *out_im = z.im;
        }
        Ok(())
    })
}

/// Write the element at a multi-index.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_set(
    tensor: *mut qt_tensor,
    indices: *const size_t,
    nidx: size_t,
    re: c_double,
    im: c_double,
) -> StatusCode {
    let (Some(tensor), Some(indices)) = (unsafe { tensor.as_mut() }, unsafe {
        slice_arg(indices, nidx)
    }) else {
        return QT_INVALID_ARGUMENT;
    };
    guard(|| tensor.inner.set(indices, c64::new(re, im)))
}

// ============================================================================
// Arithmetic and output
// ============================================================================

/// Matrix product of two rank-2 tensors.
///
/// # Returns
/// Pointer to a new owned tensor, or null on error
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_multiply(
    a: *const qt_tensor,
    b: *const qt_tensor,
    status: *mut StatusCode,
) -> *mut qt_tensor {
    let (Some(a), Some(b)) = (unsafe { a.as_ref() }, unsafe { b.as_ref() }) else {
        return invalid(status);
    };
    construct(status, || a.inner.multiply(&b.inner))
}

/// Render the tensor as nested rows into `buf`, NUL-terminated.
///
/// Pass a null `buf` to query the length through `written`.
#[unsafe(no_mangle)]
pub extern "C" fn qt_tensor_dump(
    tensor: *const qt_tensor,
    buf: *mut c_char,
    cap: size_t,
    written: *mut size_t,
) -> StatusCode {
    let Some(tensor) = (unsafe { tensor.as_ref() }) else {
        return QT_INVALID_ARGUMENT;
    };
    match catch_unwind(AssertUnwindSafe(|| tensor.inner.to_string())) {
        Ok(text) => write_text(&text, buf, cap, written),
        Err(_) => QT_INTERNAL_ERROR,
    }
}

// ============================================================================
// Registry introspection
// ============================================================================

/// Number of registered complex backends.
#[unsafe(no_mangle)]
pub extern "C" fn qt_backend_count() -> size_t {
    catch_unwind(|| BackendRegistry::<c64>::global().registered().len()).unwrap_or(0)
}

/// Name of the `index`-th registered complex backend (sorted), NUL-terminated.
#[unsafe(no_mangle)]
pub extern "C" fn qt_backend_name(
    index: size_t,
    buf: *mut c_char,
    cap: size_t,
    written: *mut size_t,
) -> StatusCode {
    let names = match catch_unwind(|| BackendRegistry::<c64>::global().registered()) {
        Ok(names) => names,
        Err(_) => return QT_INTERNAL_ERROR,
    };
    match names.get(index) {
        Some(name) => write_text(name, buf, cap, written),
        None => QT_INVALID_ARGUMENT,
    }
}
