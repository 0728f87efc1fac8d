//! The single pseudo-device the host backend reports.

use std::io::{self, Write};

use memstream_core::{DeviceCatalog, Result, StreamError};

/// Reports one fixed device, `0: CPU`, with no name or driver details.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCatalog;

impl HostCatalog {
    fn check(index: usize) -> Result<()> {
        if index == 0 { Ok(()) } else { Err(StreamError::InvalidDevice { index, count: 1 }) }
    }
}

impl DeviceCatalog for HostCatalog {
    fn device_count(&self) -> usize {
        1
    }

    fn device_name(&self, index: usize) -> Result<String> {
        Self::check(index).map(|()| "Device name unavailable".to_string())
    }

    fn device_driver(&self, index: usize) -> Result<String> {
        Self::check(index).map(|()| "Device driver unavailable".to_string())
    }

    fn write_listing(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "0: CPU")
    }
}
