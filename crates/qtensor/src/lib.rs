//! qtensor - dense complex tensors over pluggable backends
//!
//! A [`Tensor`] is a thin facade: its storage and arithmetic live in a
//! backend instance chosen by name from a per-element-kind
//! [`BackendRegistry`]. The buffer behind a tensor is tagged with an
//! [`OwnershipMode`] that decides whether it is freed on release.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Tensor facade (tensor module)
//!     → zeros, from_data, copy / borrow / take, at, multiply, dump
//!
//! Level 2: Registry (registry module)
//!     → name -> factory, default backend resolution
//!
//! Level 3: Backend implementation (backend module)
//!     → FaerBackend (row-major storage, faer GEMM)
//!     → GenericBackend (naive loops, `generic-backend` feature)
//! ```
//!
//! # Example
//!
//! ```
//! use qtensor::{OwnershipMode, Tensor, c64};
//!
//! // Create a 2x2 zero-initialized tensor on the default backend
//! let mut t: Tensor = Tensor::zeros(&[2, 2]).unwrap();
//! assert_eq!(t.mode(), OwnershipMode::Owned);
//!
//! // Replace the contents with a copy (row-major order)
//! let data = vec![
//!     c64::new(1.0, 0.0), c64::new(0.0, 1.0),
//!     c64::new(0.0, -1.0), c64::new(1.0, 0.0),
//! ];
//! t.copy(&data, &[2, 2]).unwrap();
//! assert_eq!(*t.at(&[0, 1]).unwrap(), c64::new(0.0, 1.0));
//!
//! println!("{t}");
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod random;
pub mod registry;
pub mod scalar;
pub mod storage;
pub mod strides;
pub mod tensor;

pub use config::BackendConfig;
pub use error::TensorError;
pub use random::{RandomNormal, RandomUniform};
pub use registry::BackendRegistry;
pub use scalar::{Scalar, c64};
pub use storage::{Buffer, OwnershipMode};
pub use tensor::Tensor;
