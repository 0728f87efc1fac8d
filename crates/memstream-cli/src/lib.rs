//! Driver library behind the `memstream` binary.
//!
//! [`config`] turns command-line input into a validated [`RunConfig`],
//! [`driver`] runs the timed kernel loop and checks the results,
//! [`report`] renders the statistics, and [`exit`] holds the process exit
//! codes.

pub mod config;
pub mod driver;
pub mod exit;
pub mod report;

pub use config::{BackendKind, OutputFormat, RunConfig, RunConfigBuilder};
pub use driver::{RunOutcome, Timings, Validation, run_benchmark};
pub use report::{BenchmarkReport, KernelStats};
