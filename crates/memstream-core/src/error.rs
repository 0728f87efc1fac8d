//! Error taxonomy shared by all backends.

use thiserror::Error;

/// Which capacity limit a device failed to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryShortfall {
    /// One array is larger than the device's maximum single allocation.
    #[error(
        "device cannot allocate a buffer big enough \
         ({requested} bytes requested, max allocation {max_alloc} bytes)"
    )]
    SingleAllocation { requested: u64, max_alloc: u64 },

    /// All three arrays together exceed the device's global memory.
    #[error(
        "device does not have enough memory for all 3 buffers \
         ({requested} bytes requested, {total} bytes available)"
    )]
    Aggregate { requested: u64, total: u64 },
}

/// Errors produced while constructing or driving a backend.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid device index {index}: {count} device(s) available")]
    InvalidDevice { index: usize, count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("device '{device}' does not support double precision, please use --float")]
    UnsupportedPrecision { device: String },

    #[error("kernel program build failed:\n{log}")]
    BuildFailure { log: String },

    #[error(transparent)]
    InsufficientMemory(#[from] MemoryShortfall),

    #[error(
        "host array '{array}' holds {actual} elements but the backend was \
         created for {expected}"
    )]
    TransferError { array: char, expected: usize, actual: usize },

    #[error("{operation} failed: {reason}")]
    Runtime { operation: &'static str, reason: String },
}

impl StreamError {
    /// Wrap a runtime API failure with the operation that triggered it.
    pub fn runtime(operation: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Runtime { operation, reason: reason.to_string() }
    }
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, StreamError>;
