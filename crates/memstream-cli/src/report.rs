//! Per-kernel statistics and their text and JSON renderings.

use std::io::{self, Write};
use std::time::Duration;

use memstream_core::Kernel;
use serde::Serialize;

use crate::config::{BackendKind, RunConfig};
use crate::driver::{RunOutcome, Timings};

/// Bandwidth and timing summary for one kernel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelStats {
    pub kernel: &'static str,
    pub mbytes_per_sec: f64,
    pub min_sec: f64,
    pub max_sec: f64,
    pub avg_sec: f64,
}

impl KernelStats {
    /// Summarise the post-warm-up samples of `kernel`; `None` if there are
    /// none. Bandwidth counts `element_bytes` per element of each array
    /// touched.
    pub fn compute(
        kernel: Kernel,
        timings: &Timings,
        array_size: usize,
        element_bytes: usize,
    ) -> Option<Self> {
        let samples = timings.measured(kernel);
        if samples.is_empty() {
            return None;
        }
        let secs = samples.iter().map(Duration::as_secs_f64);
        let min = secs.clone().fold(f64::INFINITY, f64::min);
        let max = secs.clone().fold(0.0, f64::max);
        let avg = secs.sum::<f64>() / samples.len() as f64;
        let bytes = (kernel.arrays_touched() * element_bytes * array_size) as f64;

        Some(Self {
            kernel: label(kernel),
            mbytes_per_sec: 1.0e-6 * bytes / min,
            min_sec: min,
            max_sec: max,
            avg_sec: avg,
        })
    }
}

fn label(kernel: Kernel) -> &'static str {
    match kernel {
        Kernel::Copy => "Copy",
        Kernel::Mul => "Mul",
        Kernel::Add => "Add",
        Kernel::Triad => "Triad",
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub index: usize,
    pub name: String,
    pub driver: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationSummary {
    pub passed: bool,
    pub tolerance: f64,
    pub errors: [f64; 3],
}

/// Machine-readable record of one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub version: &'static str,
    pub backend: BackendKind,
    pub implementation: &'static str,
    pub device: DeviceSummary,
    pub precision: String,
    /// Bytes per element moved by the kernels; wider than `precision` when
    /// the backend stores a wider type.
    pub stored_element_bytes: usize,
    #[serde(skip)]
    element_bytes: usize,
    pub array_size: usize,
    pub num_times: usize,
    pub validation: ValidationSummary,
    pub kernels: Vec<KernelStats>,
}

impl BenchmarkReport {
    pub fn new(
        config: &RunConfig,
        implementation: &'static str,
        device: DeviceSummary,
        outcome: &RunOutcome,
    ) -> Self {
        let kernels = Kernel::ALL
            .into_iter()
            .filter_map(|k| {
                KernelStats::compute(
                    k,
                    &outcome.timings,
                    config.array_size,
                    outcome.stored_element_bytes,
                )
            })
            .collect();
        Self {
            version: env!("CARGO_PKG_VERSION"),
            backend: config.backend,
            implementation,
            device,
            precision: config.precision.to_string(),
            stored_element_bytes: outcome.stored_element_bytes,
            element_bytes: config.precision.size_bytes(),
            array_size: config.array_size,
            num_times: config.num_times,
            validation: ValidationSummary {
                passed: outcome.validation.passed(),
                tolerance: outcome.validation.tolerance,
                errors: outcome.validation.errors,
            },
            kernels,
        }
    }

    /// Aligned results table.
    pub fn write_table(&self, out: &mut dyn Write) -> io::Result<()> {
        if self.stored_element_bytes != self.element_bytes {
            writeln!(
                out,
                "Note: {} arrays are stored as {}-byte elements; bandwidth counts {} bytes per element",
                self.precision, self.stored_element_bytes, self.stored_element_bytes
            )?;
        }
        writeln!(
            out,
            "{:<12}{:<12}{:<12}{:<12}{:<12}",
            "Function", "MBytes/sec", "Min (sec)", "Max", "Average"
        )?;
        for k in &self.kernels {
            writeln!(
                out,
                "{:<12}{:<12.3}{:<12.5}{:<12.5}{:<12.5}",
                k.kernel, k.mbytes_per_sec, k.min_sec, k.max_sec, k.avg_sec
            )?;
        }
        Ok(())
    }

    pub fn write_json(&self, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}

/// Human-readable run header printed before the kernels start.
pub fn write_banner(
    out: &mut dyn Write,
    config: &RunConfig,
    implementation: &str,
    device: &DeviceSummary,
) -> io::Result<()> {
    let array = config.array_bytes() as f64;
    let total = config.total_bytes() as f64;
    writeln!(out, "memstream")?;
    writeln!(out, "Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "Implementation: {implementation}")?;
    writeln!(out, "Running kernels {} times", config.num_times)?;
    writeln!(out, "Precision: {}", config.precision)?;
    writeln!(out, "Array size: {:.1} MB (={:.1} GB)", array * 1e-6, array * 1e-9)?;
    writeln!(out, "Total size: {:.1} MB (={:.1} GB)", total * 1e-6, total * 1e-9)?;
    writeln!(out, "Using device {}: {}", device.index, device.name)?;
    writeln!(out, "Driver: {}", device.driver)
}
