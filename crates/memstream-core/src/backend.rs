//! The backend interface every execution target implements.

use std::fmt;

use crate::element::StreamElement;
use crate::error::{Result, StreamError};

/// Multiplier baked into the accelerator kernel program.
pub const ACCELERATOR_SCALAR: f64 = 0.3;

/// Multiplier used by the host-offload kernels.
///
/// Differs from [`ACCELERATOR_SCALAR`]; results are not comparable across
/// backends.
pub const HOST_SCALAR: f64 = 3.0;

/// One of the four STREAM kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    Copy,
    Mul,
    Add,
    Triad,
}

impl Kernel {
    /// All kernels, in the order the driver runs them.
    pub const ALL: [Kernel; 4] = [Self::Copy, Self::Mul, Self::Add, Self::Triad];

    /// Entry-point name in the kernel program.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Mul => "mul",
            Self::Add => "add",
            Self::Triad => "triad",
        }
    }

    /// Number of arrays streamed through memory per element.
    pub const fn arrays_touched(self) -> usize {
        match self {
            Self::Copy | Self::Mul => 2,
            Self::Add | Self::Triad => 3,
        }
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete execution strategy for the four kernels and the two
/// transfer operations.
///
/// Calls are synchronous: each returns only after the target has finished
/// the work. Instances are not re-entrant, hence `&mut self` throughout.
pub trait StreamBackend<T: StreamElement> {
    /// Fixed descriptive name used in reports.
    fn implementation(&self) -> &'static str;

    /// Number of elements in each of the three arrays.
    fn array_size(&self) -> usize;

    /// Multiplier applied by `mul` and `triad`.
    fn scalar(&self) -> T;

    /// Bytes one element occupies in backend storage, which is what the
    /// kernels actually move.
    fn stored_element_bytes(&self) -> usize {
        T::PRECISION.size_bytes()
    }

    /// `c = a`
    fn copy(&mut self) -> Result<()>;

    /// `b = scalar * c`
    fn mul(&mut self) -> Result<()>;

    /// `c = a + b`
    fn add(&mut self) -> Result<()>;

    /// `a = b + scalar * c`
    fn triad(&mut self) -> Result<()>;

    /// Copy host arrays into backend storage.
    fn write_arrays(&mut self, a: &[T], b: &[T], c: &[T]) -> Result<()>;

    /// Copy backend storage out into host arrays.
    fn read_arrays(&mut self, a: &mut [T], b: &mut [T], c: &mut [T]) -> Result<()>;

    /// Run a kernel selected at runtime.
    fn run(&mut self, kernel: Kernel) -> Result<()> {
        match kernel {
            Kernel::Copy => self.copy(),
            Kernel::Mul => self.mul(),
            Kernel::Add => self.add(),
            Kernel::Triad => self.triad(),
        }
    }
}

impl<T: StreamElement, B: StreamBackend<T> + ?Sized> StreamBackend<T> for Box<B> {
    fn implementation(&self) -> &'static str {
        (**self).implementation()
    }

    fn array_size(&self) -> usize {
        (**self).array_size()
    }

    fn scalar(&self) -> T {
        (**self).scalar()
    }

    fn stored_element_bytes(&self) -> usize {
        (**self).stored_element_bytes()
    }

    fn copy(&mut self) -> Result<()> {
        (**self).copy()
    }

    fn mul(&mut self) -> Result<()> {
        (**self).mul()
    }

    fn add(&mut self) -> Result<()> {
        (**self).add()
    }

    fn triad(&mut self) -> Result<()> {
        (**self).triad()
    }

    fn write_arrays(&mut self, a: &[T], b: &[T], c: &[T]) -> Result<()> {
        (**self).write_arrays(a, b, c)
    }

    fn read_arrays(&mut self, a: &mut [T], b: &mut [T], c: &mut [T]) -> Result<()> {
        (**self).read_arrays(a, b, c)
    }
}

/// Check that a host array matches the backend's array size.
///
/// # Errors
///
/// Returns [`StreamError::TransferError`] naming the offending array.
pub fn ensure_host_len(array: char, expected: usize, actual: usize) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(StreamError::TransferError { array, expected, actual })
    }
}
