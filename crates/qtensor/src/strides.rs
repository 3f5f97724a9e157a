//! Stride computation utilities.
//!
//! Uses row-major (C) order: the last dimension varies fastest.

use crate::error::TensorError;

/// Compute row-major strides from shape.
///
/// For shape [d0, d1, d2], returns strides [d1*d2, d2, 1].
///
/// # Examples
///
/// ```
/// use qtensor::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![20, 5, 1]);
/// assert_eq!(compute_strides(&[2, 3]), vec![3, 1]);
/// assert_eq!(compute_strides(&[5]), vec![1]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![0; shape.len()];
    let mut stride = 1usize;

    for (s, &dim) in strides.iter_mut().zip(shape.iter()).rev() {
        *s = stride;
        stride = stride.saturating_mul(dim);
    }

    strides
}

/// Number of elements described by `shape`.
///
/// An empty shape is a scalar (one element). Returns `None` on overflow.
pub fn checked_size(shape: &[usize]) -> Option<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Number of elements described by `shape`, failing with
/// `AllocationFailure` when the product overflows.
pub fn size_of_shape(shape: &[usize]) -> Result<usize, TensorError> {
    checked_size(shape).ok_or_else(|| TensorError::AllocationFailure {
        shape: shape.to_vec(),
        reason: "element count overflows usize".to_string(),
    })
}

/// Convert cartesian indices to linear index using precomputed strides.
///
/// No bounds checking; see [`offset`] for the checked variant.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Convert linear index to cartesian indices using row-major order.
///
/// A shape with a zero dimension has no elements; every index maps to all
/// zeros.
pub fn linear_to_cartesian(mut linear: usize, shape: &[usize]) -> Vec<usize> {
    let mut indices = vec![0; shape.len()];
    if shape.contains(&0) {
        return indices;
    }

    for (slot, &dim) in indices.iter_mut().zip(shape.iter()).rev() {
        *slot = linear % dim;
        linear /= dim;
    }

    indices
}

/// Checked row-major flat offset of `indices` within `shape`.
///
/// Every backend addresses elements through this function.
///
/// # Errors
///
/// `IndexOutOfRange` if `indices.len() != shape.len()` or any coordinate is
/// outside its dimension.
///
/// # Examples
///
/// ```
/// use qtensor::strides::offset;
///
/// assert_eq!(offset(&[2, 3], &[1, 2]).unwrap(), 5);
/// assert_eq!(offset(&[], &[]).unwrap(), 0);
/// assert!(offset(&[2, 2], &[2, 0]).is_err());
/// assert!(offset(&[2, 2], &[0]).is_err());
/// ```
pub fn offset(shape: &[usize], indices: &[usize]) -> Result<usize, TensorError> {
    let out_of_range = || TensorError::IndexOutOfRange {
        indices: indices.to_vec(),
        shape: shape.to_vec(),
    };

    if indices.len() != shape.len() {
        return Err(out_of_range());
    }

    let mut linear = 0usize;
    let mut stride = 1usize;
    for (&idx, &dim) in indices.iter().zip(shape.iter()).rev() {
        if idx >= dim {
            return Err(out_of_range());
        }
        linear += idx * stride;
        stride *= dim;
    }

    Ok(linear)
}
