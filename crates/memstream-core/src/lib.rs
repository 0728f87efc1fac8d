//! `memstream-core`: shared vocabulary for the memstream bandwidth benchmark.
//!
//! Every execution target implements [`StreamBackend`] for the element types
//! it supports, so a single driver can run the four STREAM kernels
//! (copy, mul, add, triad) against any of them:
//!
//! | Kernel  | Operation            | Arrays touched |
//! |---------|----------------------|----------------|
//! | `copy`  | `c = a`              | 2              |
//! | `mul`   | `b = scalar * c`     | 2              |
//! | `add`   | `c = a + b`          | 3              |
//! | `triad` | `a = b + scalar * c` | 3              |
//!
//! Device metadata is exposed through [`DeviceCatalog`], which both the
//! accelerator registry and the host pseudo-device implement.

pub mod backend;
pub mod catalog;
pub mod element;
pub mod error;

pub use backend::{ACCELERATOR_SCALAR, HOST_SCALAR, Kernel, StreamBackend, ensure_host_len};
pub use catalog::DeviceCatalog;
pub use element::{Precision, StreamElement};
pub use error::{MemoryShortfall, Result, StreamError};
