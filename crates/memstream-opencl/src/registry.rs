//! Process-wide device list, populated once on first use.
//!
//! A [`DeviceRegistry`] is created at startup and passed by reference to
//! whatever needs device metadata. The underlying [`DeviceSource`] is
//! queried exactly once; every later lookup reads the cached list.

use std::sync::OnceLock;

use memstream_core::{DeviceCatalog, Result, StreamError};
use tracing::info;

use crate::device::{Device, DeviceSource};

/// Lazily populated, immutable-after-population device list.
pub struct DeviceRegistry<S: DeviceSource> {
    source: S,
    devices: OnceLock<Vec<Device<S::Handle>>>,
}

impl<S: DeviceSource> DeviceRegistry<S> {
    /// Create an unpopulated registry over `source`.
    pub fn new(source: S) -> Self {
        Self { source, devices: OnceLock::new() }
    }

    /// Whether the source has been queried yet.
    pub fn is_populated(&self) -> bool {
        self.devices.get().is_some()
    }

    /// Every device, platform by platform, in enumeration order.
    ///
    /// The first call queries the source; later calls return the same slice.
    pub fn list_all(&self) -> &[Device<S::Handle>] {
        self.devices.get_or_init(|| {
            let platforms = self.source.enumerate();
            let platform_count = platforms.len();
            let devices: Vec<_> =
                platforms.into_iter().flat_map(|platform| platform.devices).collect();
            info!(platforms = platform_count, devices = devices.len(), "device registry populated");
            devices
        })
    }

    /// Number of cached devices.
    pub fn len(&self) -> usize {
        self.list_all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.list_all().is_empty()
    }

    /// Look up device `index`.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidDevice`] if `index` is past the end of the list.
    pub fn device(&self, index: usize) -> Result<&Device<S::Handle>> {
        let devices = self.list_all();
        devices.get(index).ok_or(StreamError::InvalidDevice { index, count: devices.len() })
    }

    /// Name of device `index`.
    pub fn name_of(&self, index: usize) -> Result<&str> {
        self.device(index).map(|d| d.info().name.as_str())
    }

    /// Driver/version string of device `index`.
    pub fn driver_of(&self, index: usize) -> Result<&str> {
        self.device(index).map(|d| d.info().driver_version.as_str())
    }
}

#[cfg(feature = "opencl")]
impl DeviceRegistry<crate::device::OpenClPlatforms> {
    /// Registry over every platform the OpenCL ICD loader reports.
    pub fn opencl() -> Self {
        Self::new(crate::device::OpenClPlatforms)
    }
}

impl<S: DeviceSource> DeviceCatalog for DeviceRegistry<S> {
    fn device_count(&self) -> usize {
        self.len()
    }

    fn device_name(&self, index: usize) -> Result<String> {
        self.name_of(index).map(str::to_owned)
    }

    fn device_driver(&self, index: usize) -> Result<String> {
        self.driver_of(index).map(str::to_owned)
    }
}

impl<S: DeviceSource> std::fmt::Debug for DeviceRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("populated", &self.is_populated())
            .field("devices", &self.devices.get().map(Vec::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceInfo, PlatformDevices};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        names: Vec<Vec<&'static str>>,
        queries: AtomicUsize,
    }

    impl Counting {
        fn new(names: Vec<Vec<&'static str>>) -> Self {
            Self { names, queries: AtomicUsize::new(0) }
        }
    }

    impl DeviceSource for Counting {
        type Handle = ();

        fn enumerate(&self) -> Vec<PlatformDevices<()>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.names
                .iter()
                .enumerate()
                .map(|(p, names)| PlatformDevices {
                    platform: format!("platform-{p}"),
                    devices: names
                        .iter()
                        .map(|n| {
                            let info = DeviceInfo {
                                name: (*n).to_string(),
                                driver_version: format!("{n}-driver"),
                                ..Default::default()
                            };
                            Device::new(info, ())
                        })
                        .collect(),
                })
                .collect()
        }
    }

    #[test]
    fn population_is_lazy_and_happens_once() {
        let registry = DeviceRegistry::new(Counting::new(vec![vec!["gpu0"]]));
        assert!(!registry.is_populated());
        assert_eq!(registry.source.queries.load(Ordering::SeqCst), 0);

        let _ = registry.list_all();
        let _ = registry.name_of(0);
        let _ = registry.driver_of(5);
        let _ = registry.list_all();

        assert!(registry.is_populated());
        assert_eq!(registry.source.queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn lookups_trigger_population() {
        let registry = DeviceRegistry::new(Counting::new(vec![vec!["gpu0"]]));
        assert_eq!(registry.name_of(0).unwrap(), "gpu0");
        assert!(registry.is_populated());
    }

    #[test]
    fn devices_are_concatenated_platform_then_device() {
        let registry = DeviceRegistry::new(Counting::new(vec![
            vec!["p0-d0", "p0-d1"],
            vec![],
            vec!["p2-d0"],
        ]));
        let names: Vec<_> = registry.list_all().iter().map(|d| d.info().name.clone()).collect();
        assert_eq!(names, ["p0-d0", "p0-d1", "p2-d0"]);
    }

    #[test]
    fn out_of_range_index_is_invalid_device() {
        let registry = DeviceRegistry::new(Counting::new(vec![vec!["a", "b"]]));
        let count = registry.len();
        assert!(matches!(
            registry.name_of(count),
            Err(StreamError::InvalidDevice { index: 2, count: 2 })
        ));
        assert!(matches!(registry.driver_of(count), Err(StreamError::InvalidDevice { .. })));
        assert!(matches!(registry.device(usize::MAX), Err(StreamError::InvalidDevice { .. })));
    }

    #[test]
    fn driver_lookup_returns_driver_string() {
        let registry = DeviceRegistry::new(Counting::new(vec![vec!["a"]]));
        assert_eq!(registry.driver_of(0).unwrap(), "a-driver");
        assert_eq!(registry.device_driver(0).unwrap(), "a-driver");
    }

    #[test]
    fn catalog_listing_matches_registry() {
        let registry = DeviceRegistry::new(Counting::new(vec![vec!["a"], vec!["b"]]));
        let mut out = Vec::new();
        registry.write_listing(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\nDevices:\n0: a\n1: b\n\n");
    }

    #[test]
    fn empty_registry_reports_no_devices() {
        let registry = DeviceRegistry::new(Counting::new(vec![]));
        assert!(registry.is_empty());
        let mut out = Vec::new();
        registry.write_listing(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "No devices found.\n");
    }
}
