//! Square 2D-image layout for the three benchmark arrays.
//!
//! The accelerator keeps each array in a `side × side` image rather than a
//! flat buffer, so the array size must be a perfect square. Each texel holds
//! exactly one array element:
//!
//! | Precision | Channel order | Channel type        | Bytes/texel |
//! |-----------|---------------|---------------------|-------------|
//! | `float`   | `CL_R`        | `CL_FLOAT`          | 4           |
//! | `double`  | `CL_RG`       | `CL_UNSIGNED_INT32` | 8           |
//!
//! A `double` is stored as the raw bit pattern split over two 32-bit
//! channels; the kernels reassemble it with `as_double`.

use std::fmt;

use memstream_core::{MemoryShortfall, Precision, Result, StreamError};

use crate::device::DeviceInfo;

/// Image channel order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {
    /// One channel (`CL_R`).
    R,
    /// Two channels (`CL_RG`).
    Rg,
}

impl ChannelOrder {
    pub const fn num_channels(self) -> usize {
        match self {
            Self::R => 1,
            Self::Rg => 2,
        }
    }
}

impl fmt::Display for ChannelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::R => write!(f, "CL_R"),
            Self::Rg => write!(f, "CL_RG"),
        }
    }
}

/// Image channel data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelType {
    /// 32-bit IEEE 754 float (`CL_FLOAT`).
    Float,
    /// 32-bit unsigned integer (`CL_UNSIGNED_INT32`).
    UnsignedInt32,
}

impl ChannelType {
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::Float | Self::UnsignedInt32 => 4,
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float => write!(f, "CL_FLOAT"),
            Self::UnsignedInt32 => write!(f, "CL_UNSIGNED_INT32"),
        }
    }
}

/// Texel format of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridFormat {
    pub channel_order: ChannelOrder,
    pub channel_type: ChannelType,
}

impl GridFormat {
    pub const fn new(channel_order: ChannelOrder, channel_type: ChannelType) -> Self {
        Self { channel_order, channel_type }
    }

    /// The texel format holding one element of the given precision.
    pub const fn for_precision(precision: Precision) -> Self {
        match precision {
            Precision::Single => Self::new(ChannelOrder::R, ChannelType::Float),
            Precision::Double => Self::new(ChannelOrder::Rg, ChannelType::UnsignedInt32),
        }
    }

    pub const fn bytes_per_texel(&self) -> usize {
        self.channel_order.num_channels() * self.channel_type.size_bytes()
    }
}

impl fmt::Display for GridFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.channel_order, self.channel_type)
    }
}

/// Validated dimensions of the three device-resident grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    /// Elements per array; always `side * side`.
    pub array_size: usize,
    /// Grid side length in texels.
    pub side: usize,
    pub format: GridFormat,
}

impl GridLayout {
    /// Origin of a whole-grid transfer.
    pub const ORIGIN: [usize; 3] = [0, 0, 0];

    /// Lay out `array_size` elements as a square grid.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidConfiguration`] when `array_size` is zero or
    /// not a perfect square.
    pub fn square(array_size: usize, precision: Precision) -> Result<Self> {
        if array_size == 0 {
            return Err(StreamError::InvalidConfiguration(
                "array_size must be positive".into(),
            ));
        }
        let side = array_size.isqrt();
        if side * side != array_size {
            return Err(StreamError::InvalidConfiguration(format!(
                "array_size must be square for 2D images \
                 ({array_size} is not; nearest are {} and {})",
                side * side,
                (side + 1) * (side + 1),
            )));
        }
        Ok(Self { array_size, side, format: GridFormat::for_precision(precision) })
    }

    /// Extent of a whole-grid transfer: `side × side × 1`.
    pub const fn region(&self) -> [usize; 3] {
        [self.side, self.side, 1]
    }

    /// 2D NDRange covering every texel.
    pub const fn global_work_size(&self) -> [usize; 2] {
        [self.side, self.side]
    }

    /// Bytes occupied by one grid.
    pub fn grid_bytes(&self) -> u64 {
        self.array_size as u64 * self.format.bytes_per_texel() as u64
    }

    /// Bytes occupied by all three grids.
    pub fn total_bytes(&self) -> u64 {
        3 * self.grid_bytes()
    }
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{side}×{side} ({})", self.format, side = self.side)
    }
}

/// Refuse double precision on devices that do not advertise it.
pub fn check_precision(info: &DeviceInfo, precision: Precision) -> Result<()> {
    match precision {
        Precision::Double if !info.supports_fp64 => {
            Err(StreamError::UnsupportedPrecision { device: info.name.clone() })
        }
        _ => Ok(()),
    }
}

/// Check that the device can hold one grid in a single allocation and all
/// three grids at once.
pub fn check_capacity(info: &DeviceInfo, layout: &GridLayout) -> Result<()> {
    let requested = layout.grid_bytes();
    if info.max_alloc_bytes < requested {
        return Err(MemoryShortfall::SingleAllocation {
            requested,
            max_alloc: info.max_alloc_bytes,
        }
        .into());
    }
    let requested = layout.total_bytes();
    if info.global_mem_bytes < requested {
        return Err(MemoryShortfall::Aggregate { requested, total: info.global_mem_bytes }.into());
    }
    Ok(())
}

/// Check that the device supports images and the grid side fits its limits.
pub fn check_image_limits(info: &DeviceInfo, layout: &GridLayout) -> Result<()> {
    if !info.image_support {
        return Err(StreamError::InvalidConfiguration(format!(
            "device '{}' does not support images",
            info.name
        )));
    }
    if layout.side > info.image2d_max_width || layout.side > info.image2d_max_height {
        return Err(StreamError::InvalidConfiguration(format!(
            "{side}×{side} grid exceeds the device's 2D image limit of {}×{}",
            info.image2d_max_width,
            info.image2d_max_height,
            side = layout.side,
        )));
    }
    Ok(())
}

/// Device-side preconditions that need no runtime call, in the order
/// construction enforces them: perfect square, image limits, precision.
///
/// Capacity is checked separately with [`check_capacity`], once the program
/// has built.
pub fn validate(info: &DeviceInfo, array_size: usize, precision: Precision) -> Result<GridLayout> {
    let layout = GridLayout::square(array_size, precision)?;
    check_image_limits(info, &layout)?;
    check_precision(info, precision)?;
    Ok(layout)
}
