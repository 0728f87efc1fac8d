//! Device metadata lookups shared by every backend family.

use std::io::{self, Write};

use crate::error::Result;

/// Index-addressed device metadata, as offered to a `--list` style flag.
pub trait DeviceCatalog {
    /// Number of devices this catalog exposes.
    fn device_count(&self) -> usize;

    /// Human-readable name of device `index`.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidDevice`](crate::StreamError::InvalidDevice) when
    /// `index >= device_count()`.
    fn device_name(&self, index: usize) -> Result<String>;

    /// Driver/version string of device `index`.
    ///
    /// # Errors
    ///
    /// Same contract as [`device_name`](Self::device_name).
    fn device_driver(&self, index: usize) -> Result<String>;

    /// Write an enumerated `index: name` listing, or a notice when empty.
    fn write_listing(&self, out: &mut dyn Write) -> io::Result<()> {
        let count = self.device_count();
        if count == 0 {
            return writeln!(out, "No devices found.");
        }
        writeln!(out)?;
        writeln!(out, "Devices:")?;
        for index in 0..count {
            let name = self.device_name(index).unwrap_or_else(|e| format!("<{e}>"));
            writeln!(out, "{index}: {name}")?;
        }
        writeln!(out)
    }

    /// Print the listing to stdout, or the empty notice to stderr.
    fn print_all(&self) -> io::Result<()> {
        if self.device_count() == 0 {
            self.write_listing(&mut io::stderr().lock())
        } else {
            self.write_listing(&mut io::stdout().lock())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamError;

    struct Named(Vec<&'static str>);

    impl DeviceCatalog for Named {
        fn device_count(&self) -> usize {
            self.0.len()
        }

        fn device_name(&self, index: usize) -> Result<String> {
            self.0
                .get(index)
                .map(|s| (*s).to_string())
                .ok_or(StreamError::InvalidDevice { index, count: self.0.len() })
        }

        fn device_driver(&self, index: usize) -> Result<String> {
            self.device_name(index).map(|_| "1.0".to_string())
        }
    }

    fn listing(catalog: &dyn DeviceCatalog) -> String {
        let mut out = Vec::new();
        catalog.write_listing(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn listing_enumerates_in_order() {
        let text = listing(&Named(vec!["gpu-a", "gpu-b"]));
        assert_eq!(text, "\nDevices:\n0: gpu-a\n1: gpu-b\n\n");
    }

    #[test]
    fn empty_listing_prints_notice() {
        assert_eq!(listing(&Named(vec![])), "No devices found.\n");
    }
}
