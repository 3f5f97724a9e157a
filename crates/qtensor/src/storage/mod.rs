//! Ownership envelope for tensor data.
//!
//! A tensor's elements live in exactly one of three kinds of buffer:
//!
//! ```text
//! Buffer<T>
//! ├── Owned     - allocated by the backend, freed on release
//! ├── Borrowed  - caller's memory, never freed here
//! └── Taken     - caller's allocation handed over, freed on release
//! ```
//!
//! Release happens when the buffer is dropped, which is also what happens to
//! the previous buffer when a backend attaches a new one.

mod buffer;

pub use buffer::{Buffer, OwnershipMode, allocate, allocate_boxed};
