//! OpenCL accelerator backend for memstream.
//!
//! This crate provides:
//! - [`registry`]: lazily populated, index-addressed list of every OpenCL
//!   device on every platform
//! - [`grid`]: square 2D-image layout, texel formats and device capacity
//!   validation
//! - [`kernels`]: the precision-parameterised OpenCL C kernel program
//! - `backend`: [`AcceleratorBackend`], which keeps the three arrays in
//!   2D images and runs each kernel as a blocking launch
//!   (requires the `opencl` feature)
//!
//! Everything except the backend itself is pure Rust and usable without an
//! OpenCL ICD loader.

#[cfg(feature = "opencl")]
pub mod backend;
pub mod device;
pub mod grid;
pub mod kernels;
pub mod registry;

#[cfg(feature = "opencl")]
pub use backend::{AcceleratorBackend, IMPLEMENTATION};
#[cfg(feature = "opencl")]
pub use device::OpenClPlatforms;
pub use device::{Device, DeviceInfo, DeviceSource, PlatformDevices};
pub use grid::{ChannelOrder, ChannelType, GridFormat, GridLayout};
pub use registry::DeviceRegistry;
