//! memstream: STREAM-style memory bandwidth benchmark.

use std::io::{self, Write};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use memstream_cli::config::{BackendKind, OutputFormat, RunConfig};
use memstream_cli::driver::run_benchmark;
use memstream_cli::exit::{self, EXIT_SUCCESS, EXIT_VALIDATION_FAIL};
use memstream_cli::report::{BenchmarkReport, DeviceSummary, write_banner};
use memstream_core::{DeviceCatalog, Precision, StreamBackend, StreamElement};
use memstream_host::{HostCatalog, HostConfig, HostOffloadBackend};
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(name = "memstream")]
#[command(about = "Measure sustainable memory bandwidth with the STREAM kernels")]
#[command(version)]
struct Cli {
    /// List the devices of the selected backend and exit
    #[arg(long)]
    list: bool,

    /// Device index, as printed by --list
    #[arg(long, value_name = "INDEX")]
    device: Option<usize>,

    /// Elements per array (a perfect square for the OpenCL backend)
    #[arg(short = 's', long = "arraysize", value_name = "N")]
    array_size: Option<usize>,

    /// Kernel iterations, the first is discarded as warm-up
    #[arg(short = 'n', long = "numtimes", value_name = "N")]
    num_times: Option<usize>,

    /// Use single precision instead of double
    #[arg(long)]
    float: bool,

    /// Where the kernels run
    #[arg(long, value_enum, default_value_t = BackendKind::default())]
    backend: BackendKind,

    /// Host backend worker threads (default: one per core)
    #[arg(long, value_name = "N")]
    threads: Option<usize>,

    /// Result format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level filter, overridden by RUST_LOG
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,

    #[arg(long, value_enum, default_value = "compact")]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Compact,
    Json,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level, cli.log_format);

    let code = match execute(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            for cause in e.chain().skip(1) {
                error!("  Caused by: {cause}");
            }
            exit::code_for(&e)
        }
    };
    process::exit(code);
}

fn setup_logging(level: &str, format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match format {
        LogFormat::Json => {
            subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).init()
        }
        LogFormat::Compact => subscriber.compact().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}

fn execute(cli: &Cli) -> Result<i32> {
    let config = RunConfig::builder()
        .backend(cli.backend)
        .device(cli.device)
        .array_size(cli.array_size)
        .num_times(cli.num_times)
        .single_precision(cli.float)
        .threads(cli.threads)
        .format(cli.format)
        .build()
        .context("invalid arguments")?;
    debug!(?config, "resolved configuration");

    let target = Target::open(config.backend)?;

    if cli.list {
        target.catalog().print_all().context("failed to print device list")?;
        return Ok(EXIT_SUCCESS);
    }

    match config.precision {
        Precision::Single => run::<f32>(&config, &target),
        Precision::Double => run::<f64>(&config, &target),
    }
}

/// The selected backend's device catalog, kept alive for the whole run.
enum Target {
    Host(HostCatalog),
    #[cfg(feature = "opencl")]
    OpenCl(memstream_opencl::DeviceRegistry<memstream_opencl::OpenClPlatforms>),
}

impl Target {
    fn open(kind: BackendKind) -> Result<Self> {
        match kind {
            BackendKind::Host => Ok(Self::Host(HostCatalog)),
            #[cfg(feature = "opencl")]
            BackendKind::Opencl => Ok(Self::OpenCl(memstream_opencl::DeviceRegistry::opencl())),
            #[cfg(not(feature = "opencl"))]
            BackendKind::Opencl => Err(memstream_core::StreamError::InvalidConfiguration(
                "this build has no OpenCL support; rebuild with --features opencl \
                 or pass --backend host"
                    .into(),
            )
            .into()),
        }
    }

    fn catalog(&self) -> &dyn DeviceCatalog {
        match self {
            Self::Host(catalog) => catalog,
            #[cfg(feature = "opencl")]
            Self::OpenCl(registry) => registry,
        }
    }

    fn backend<T: StreamElement>(&self, config: &RunConfig) -> Result<Box<dyn StreamBackend<T>>> {
        let backend: Box<dyn StreamBackend<T>> = match self {
            Self::Host(_) => Box::new(HostOffloadBackend::<T>::with_config(
                config.array_size,
                HostConfig { threads: config.threads },
            )?),
            #[cfg(feature = "opencl")]
            Self::OpenCl(registry) => Box::new(memstream_opencl::AcceleratorBackend::<T>::new(
                registry,
                config.array_size,
                config.device,
            )?),
        };
        Ok(backend)
    }
}

fn run<T: StreamElement>(config: &RunConfig, target: &Target) -> Result<i32> {
    let catalog = target.catalog();
    let device = DeviceSummary {
        index: config.device,
        name: catalog.device_name(config.device)?,
        driver: catalog.device_driver(config.device)?,
    };

    let mut backend = target.backend::<T>(config).context("failed to create backend")?;
    let implementation = backend.implementation();

    let mut stdout = io::stdout().lock();
    if config.format == OutputFormat::Text {
        write_banner(&mut stdout, config, implementation, &device)?;
        stdout.flush()?;
    }

    let outcome = run_benchmark(backend.as_mut(), config.num_times).context("benchmark failed")?;

    for (array, err) in outcome.validation.failures() {
        eprintln!("Validation failed on {array}[]. Average error {err}");
    }

    let report = BenchmarkReport::new(config, implementation, device, &outcome);
    match config.format {
        OutputFormat::Text => report.write_table(&mut stdout)?,
        OutputFormat::Json => report.write_json(&mut stdout)?,
    }

    Ok(if report.validation.passed { EXIT_SUCCESS } else { EXIT_VALIDATION_FAIL })
}
