//! Error types for qtensor.

use thiserror::Error;

/// Errors that can occur in tensor operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TensorError {
    /// Supplied buffer is too small for the declared shape.
    #[error("invalid shape {shape:?}: requires {required} elements, buffer has {actual}")]
    InvalidShape {
        shape: Vec<usize>,
        required: usize,
        actual: usize,
    },

    /// Coordinate out of bounds, or index count differs from rank.
    #[error("index {indices:?} out of range for shape {shape:?}")]
    IndexOutOfRange {
        indices: Vec<usize>,
        shape: Vec<usize>,
    },

    /// Operand shapes are incompatible for the requested operation.
    #[error("shape mismatch: {lhs:?} vs {rhs:?}")]
    ShapeMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Operands live on different backends.
    #[error("backend mismatch: {lhs} vs {rhs}")]
    BackendMismatch { lhs: String, rhs: String },

    /// No backend registered under this name.
    #[error("unknown backend `{name}` (registered: {registered:?})")]
    UnknownBackend {
        name: String,
        registered: Vec<String>,
    },

    /// A backend with this name is already registered.
    #[error("backend `{name}` is already registered")]
    DuplicateBackend { name: String },

    /// Implicit default requested, but zero or several backends are registered.
    #[error("no default backend: {} registered ({registered:?}); configure one explicitly", .registered.len())]
    AmbiguousBackend { registered: Vec<String> },

    /// Storage could not be obtained.
    #[error("allocation failure for shape {shape:?}: {reason}")]
    AllocationFailure { shape: Vec<usize>, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = TensorError::IndexOutOfRange {
            indices: vec![2, 0],
            shape: vec![2, 2],
        };
        assert_eq!(
            err.to_string(),
            "index [2, 0] out of range for shape [2, 2]"
        );

        let err = TensorError::AmbiguousBackend { registered: vec![] };
        assert!(err.to_string().starts_with("no default backend: 0 registered"));
    }
}
