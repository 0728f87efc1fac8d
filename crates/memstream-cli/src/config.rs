//! Validated run configuration.

use std::fmt;

use clap::ValueEnum;
use memstream_core::{Precision, Result, StreamError};
use serde::Serialize;

/// 4096², a perfect square so the accelerator backend accepts it.
pub const DEFAULT_ARRAY_SIZE: usize = 4096 * 4096;

pub const DEFAULT_NUM_TIMES: usize = 100;

/// Execution target for the kernels.
///
/// Defaults to `Opencl` when built with the `opencl` feature and to `Host`
/// otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// OpenCL device holding the arrays as 2D images.
    #[cfg_attr(feature = "opencl", default)]
    Opencl,
    /// Host cores via a rayon pool.
    #[cfg_attr(not(feature = "opencl"), default)]
    Host,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opencl => "opencl",
            Self::Host => "host",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything needed to run one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub backend: BackendKind,
    pub device: usize,
    pub array_size: usize,
    /// Kernel iterations; the first one is discarded as warm-up.
    pub num_times: usize,
    pub precision: Precision,
    /// Host pool size, `None` for one thread per core.
    pub threads: Option<usize>,
    pub format: OutputFormat,
}

impl RunConfig {
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Bytes held by one array.
    pub fn array_bytes(&self) -> u64 {
        self.array_size as u64 * self.precision.size_bytes() as u64
    }

    /// Bytes held by all three arrays.
    pub fn total_bytes(&self) -> u64 {
        3 * self.array_bytes()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            device: 0,
            array_size: DEFAULT_ARRAY_SIZE,
            num_times: DEFAULT_NUM_TIMES,
            precision: Precision::Double,
            threads: None,
            format: OutputFormat::default(),
        }
    }
}

/// Builder for [`RunConfig`]; `None` leaves the default in place.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn device(mut self, device: Option<usize>) -> Self {
        if let Some(device) = device {
            self.config.device = device;
        }
        self
    }

    pub fn array_size(mut self, array_size: Option<usize>) -> Self {
        if let Some(n) = array_size {
            self.config.array_size = n;
        }
        self
    }

    pub fn num_times(mut self, num_times: Option<usize>) -> Self {
        if let Some(n) = num_times {
            self.config.num_times = n;
        }
        self
    }

    pub fn single_precision(mut self, single: bool) -> Self {
        self.config.precision = if single { Precision::Single } else { Precision::Double };
        self
    }

    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn build(self) -> Result<RunConfig> {
        let config = self.config;
        if config.array_size == 0 {
            return Err(StreamError::InvalidConfiguration("array size must be positive".into()));
        }
        if config.num_times < 2 {
            return Err(StreamError::InvalidConfiguration(format!(
                "numtimes must be at least 2 (got {}); the first iteration is discarded",
                config.num_times
            )));
        }
        if config.threads == Some(0) {
            return Err(StreamError::InvalidConfiguration("thread count must be positive".into()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RunConfig::builder().build().unwrap();
        assert_eq!(config.array_size, 16_777_216);
        assert_eq!(config.num_times, 100);
        assert_eq!(config.precision, Precision::Double);
        assert_eq!(config.device, 0);
    }

    #[test]
    fn default_backend_is_one_this_build_can_run() {
        let expected = if cfg!(feature = "opencl") { BackendKind::Opencl } else { BackendKind::Host };
        assert_eq!(RunConfig::default().backend, expected);
        assert_eq!(RunConfig::builder().build().unwrap().backend, expected);
    }

    #[test]
    fn unset_options_keep_defaults() {
        let config = RunConfig::builder()
            .device(None)
            .array_size(Some(1024))
            .num_times(None)
            .build()
            .unwrap();
        assert_eq!(config.array_size, 1024);
        assert_eq!(config.num_times, DEFAULT_NUM_TIMES);
    }

    #[test]
    fn float_flag_selects_single_precision() {
        let config = RunConfig::builder().single_precision(true).build().unwrap();
        assert_eq!(config.precision, Precision::Single);
        assert_eq!(config.total_bytes(), 3 * 4 * DEFAULT_ARRAY_SIZE as u64);
    }

    #[test]
    fn rejects_single_iteration() {
        let err = RunConfig::builder().num_times(Some(1)).build().unwrap_err();
        assert!(matches!(err, StreamError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_empty_arrays() {
        let err = RunConfig::builder().array_size(Some(0)).build().unwrap_err();
        assert!(err.to_string().contains("array size"));
    }

    #[test]
    fn rejects_zero_threads() {
        assert!(RunConfig::builder().threads(Some(0)).build().is_err());
        assert_eq!(RunConfig::builder().threads(Some(2)).build().unwrap().threads, Some(2));
    }
}
