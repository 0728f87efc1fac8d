//! Numeric element types the kernels can be instantiated for.

use std::fmt;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Floating-point precision a kernel program is specialised for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    /// 32-bit IEEE 754 (`float`).
    Single,
    /// 64-bit IEEE 754 (`double`).
    Double,
}

impl Precision {
    /// Map an element byte width onto a precision, if it is one we support.
    pub const fn from_byte_width(width: usize) -> Option<Self> {
        match width {
            4 => Some(Self::Single),
            8 => Some(Self::Double),
            _ => None,
        }
    }

    /// Bytes per element.
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Single => 4,
            Self::Double => 8,
        }
    }

    /// Name of the matching C scalar type.
    pub const fn c_type(self) -> &'static str {
        match self {
            Self::Single => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_type())
    }
}

/// A scalar type the benchmark arrays can hold.
///
/// Sealed: only `f32` and `f64` implement it.
pub trait StreamElement:
    sealed::Sealed
    + Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + 'static
{
    /// Precision selected from the type's byte width.
    const PRECISION: Precision;

    /// Machine epsilon, used to derive validation tolerances.
    const EPSILON: Self;

    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;
}

impl StreamElement for f32 {
    const PRECISION: Precision = match Precision::from_byte_width(size_of::<f32>()) {
        Some(p) => p,
        None => panic!("f32 width"),
    };
    const EPSILON: Self = f32::EPSILON;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl StreamElement for f64 {
    const PRECISION: Precision = match Precision::from_byte_width(size_of::<f64>()) {
        Some(p) => p,
        None => panic!("f64 width"),
    };
    const EPSILON: Self = f64::EPSILON;

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}
