//! Host-offload backend for memstream.
//!
//! Runs the four STREAM kernels over flat, host-resident arrays with a
//! rayon parallel-for per call. There is no device, program or capacity
//! check; the host is assumed able to hold the arrays.

pub mod backend;
pub mod catalog;

pub use backend::{HostConfig, HostOffloadBackend, IMPLEMENTATION};
pub use catalog::HostCatalog;
