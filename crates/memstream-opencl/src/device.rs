//! Device records and the sources that enumerate them.

use std::fmt;

/// Device properties captured once at enumeration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Human-readable device name (`CL_DEVICE_NAME`).
    pub name: String,
    /// Driver version string (`CL_DRIVER_VERSION`).
    pub driver_version: String,
    /// Device vendor string.
    pub vendor: String,
    /// Total global memory in bytes.
    pub global_mem_bytes: u64,
    /// Largest single allocation in bytes.
    pub max_alloc_bytes: u64,
    /// Whether `CL_DEVICE_DOUBLE_FP_CONFIG` is non-zero.
    pub supports_fp64: bool,
    /// Whether the device supports image objects at all.
    pub image_support: bool,
    /// Maximum 2D image width in pixels.
    pub image2d_max_width: usize,
    /// Maximum 2D image height in pixels.
    pub image2d_max_height: usize,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {:.1} GiB, fp64: {})",
            self.name,
            self.driver_version,
            self.global_mem_bytes as f64 / (1u64 << 30) as f64,
            if self.supports_fp64 { "yes" } else { "no" },
        )
    }
}

/// A device paired with the runtime handle used to bind to it.
///
/// The handle is non-owning: the platform runtime keeps the device alive.
#[derive(Debug, Clone)]
pub struct Device<H> {
    info: DeviceInfo,
    handle: H,
}

impl<H> Device<H> {
    pub fn new(info: DeviceInfo, handle: H) -> Self {
        Self { info, handle }
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }
}

/// Devices exposed by one platform, in the platform's own order.
#[derive(Debug, Clone)]
pub struct PlatformDevices<H> {
    pub platform: String,
    pub devices: Vec<Device<H>>,
}

/// Something that can enumerate compute devices, grouped by platform.
///
/// Enumeration is infallible: a platform that cannot be queried simply
/// contributes no devices.
pub trait DeviceSource {
    /// Runtime handle stored alongside each device.
    type Handle;

    /// Query every platform for every device of every type.
    fn enumerate(&self) -> Vec<PlatformDevices<Self::Handle>>;
}

#[cfg(feature = "opencl")]
pub use self::opencl::OpenClPlatforms;

#[cfg(feature = "opencl")]
mod opencl {
    use super::{Device, DeviceInfo, DeviceSource, PlatformDevices};
    use opencl3::device::{CL_DEVICE_TYPE_ALL, Device as ClDevice};
    use opencl3::platform::get_platforms;
    use tracing::{debug, warn};

    /// Enumerates devices through the OpenCL ICD loader.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct OpenClPlatforms;

    impl DeviceSource for OpenClPlatforms {
        type Handle = ClDevice;

        fn enumerate(&self) -> Vec<PlatformDevices<ClDevice>> {
            let platforms = match get_platforms() {
                Ok(platforms) => platforms,
                Err(e) => {
                    warn!(error = %e, "OpenCL platform query failed");
                    return Vec::new();
                }
            };

            platforms
                .iter()
                .map(|platform| {
                    let platform_name = platform.name().unwrap_or_default();
                    debug!(platform = %platform_name, "scanning OpenCL platform");

                    let devices = platform
                        .get_devices(CL_DEVICE_TYPE_ALL)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|id| {
                            let device = ClDevice::new(id);
                            let info = query_info(&device);
                            debug!(name = %info.name, vendor = %info.vendor, "found OpenCL device");
                            Device::new(info, device)
                        })
                        .collect();

                    PlatformDevices { platform: platform_name, devices }
                })
                .collect()
        }
    }

    fn query_info(device: &ClDevice) -> DeviceInfo {
        DeviceInfo {
            name: device.name().unwrap_or_default(),
            driver_version: device.driver_version().unwrap_or_default(),
            vendor: device.vendor().unwrap_or_default(),
            global_mem_bytes: device.global_mem_size().unwrap_or(0),
            max_alloc_bytes: device.max_mem_alloc_size().unwrap_or(0),
            supports_fp64: device.double_fp_config().map(|cfg| cfg != 0).unwrap_or(false),
            image_support: device.image_support().unwrap_or(false),
            image2d_max_width: device.image2d_max_width().unwrap_or(0),
            image2d_max_height: device.image2d_max_height().unwrap_or(0),
        }
    }
}
