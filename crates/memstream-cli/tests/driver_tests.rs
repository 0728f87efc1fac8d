//! End-to-end driver runs against the host backend.

use memstream_cli::config::{BackendKind, OutputFormat, RunConfig};
use memstream_cli::driver::{Validation, run_benchmark};
use memstream_cli::report::{BenchmarkReport, DeviceSummary};
use memstream_core::{HOST_SCALAR, Kernel, StreamBackend, StreamError};
use memstream_host::{HostConfig, HostOffloadBackend};
use proptest::prelude::*;

fn host_config(array_size: usize, num_times: usize, single: bool) -> RunConfig {
    RunConfig::builder()
        .backend(BackendKind::Host)
        .array_size(Some(array_size))
        .num_times(Some(num_times))
        .single_precision(single)
        .threads(Some(2))
        .format(OutputFormat::Json)
        .build()
        .unwrap()
}

#[test]
fn double_precision_run_validates() {
    let mut backend =
        HostOffloadBackend::<f64>::with_config(4096, HostConfig { threads: Some(2) }).unwrap();
    let outcome = run_benchmark(&mut backend, 10).unwrap();

    assert!(outcome.validation.passed(), "{:?}", outcome.validation);
    for kernel in Kernel::ALL {
        assert_eq!(outcome.timings.samples(kernel).len(), 10);
        assert_eq!(outcome.timings.measured(kernel).len(), 9);
    }

    let mut a = vec![0.0; 4096];
    let (mut b, mut c) = (a.clone(), a.clone());
    backend.read_arrays(&mut a, &mut b, &mut c).unwrap();
    let gold = Validation::gold_values(HOST_SCALAR, 10);
    assert!(a.iter().all(|&x| x == gold[0]));
}

#[test]
fn single_precision_run_validates() {
    let mut backend = HostOffloadBackend::<f32>::new(1000).unwrap();
    let outcome = run_benchmark(&mut backend, 5).unwrap();
    assert!(outcome.validation.passed(), "{:?}", outcome.validation);
    assert!((outcome.validation.tolerance - 100.0 * f64::from(f32::EPSILON)).abs() < 1e-20);
}

#[test]
fn long_single_precision_run_survives_overflow() {
    // 15^k growth overflows f32 long before 100 iterations.
    let mut backend = HostOffloadBackend::<f32>::new(64).unwrap();
    let outcome = run_benchmark(&mut backend, 100).unwrap();
    assert!(outcome.validation.passed(), "{:?}", outcome.validation);
}

#[test]
fn runs_through_boxed_backend() {
    let mut backend: Box<dyn StreamBackend<f64>> =
        Box::new(HostOffloadBackend::<f64>::new(256).unwrap());
    let outcome = run_benchmark(backend.as_mut(), 2).unwrap();
    assert!(outcome.validation.passed());
}

#[test]
fn json_report_lists_all_kernels() {
    let config = host_config(2048, 3, false);
    let mut backend = HostOffloadBackend::<f64>::new(config.array_size).unwrap();
    let outcome = run_benchmark(&mut backend, config.num_times).unwrap();
    let device = DeviceSummary { index: 0, name: "CPU".into(), driver: "n/a".into() };
    let report = BenchmarkReport::new(&config, backend.implementation(), device, &outcome);

    let mut out = Vec::new();
    report.write_json(&mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(json["backend"], "host");
    assert_eq!(json["precision"], "double");
    assert_eq!(json["array_size"], 2048);
    assert_eq!(json["validation"]["passed"], true);
    let names: Vec<&str> =
        json["kernels"].as_array().unwrap().iter().map(|k| k["kernel"].as_str().unwrap()).collect();
    assert_eq!(names, ["Copy", "Mul", "Add", "Triad"]);
}

#[test]
fn text_table_has_header_and_one_row_per_kernel() {
    let config = host_config(512, 2, true);
    let mut backend = HostOffloadBackend::<f32>::new(config.array_size).unwrap();
    let outcome = run_benchmark(&mut backend, config.num_times).unwrap();
    let device = DeviceSummary { index: 0, name: "CPU".into(), driver: "n/a".into() };
    let report = BenchmarkReport::new(&config, backend.implementation(), device, &outcome);

    let mut out = Vec::new();
    report.write_table(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].contains("stored as 8-byte elements"), "{text}");
    assert!(lines[1].starts_with("Function    MBytes/sec"));
    assert!(lines[5].starts_with("Triad"));
}

#[test]
fn host_single_precision_bandwidth_counts_double_storage() {
    let config = host_config(4096, 3, true);
    let mut backend = HostOffloadBackend::<f32>::new(config.array_size).unwrap();
    let outcome = run_benchmark(&mut backend, config.num_times).unwrap();
    assert_eq!(outcome.stored_element_bytes, 8);

    let device = DeviceSummary { index: 0, name: "CPU".into(), driver: "n/a".into() };
    let report = BenchmarkReport::new(&config, backend.implementation(), device, &outcome);
    let copy = &report.kernels[0];
    let expected = 1.0e-6 * (2 * 8 * config.array_size) as f64 / copy.min_sec;
    assert!((copy.mbytes_per_sec - expected).abs() <= 1e-9 * expected);

    let mut out = Vec::new();
    report.write_json(&mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["precision"], "float");
    assert_eq!(json["stored_element_bytes"], 8);
}

#[test]
fn double_precision_table_has_no_storage_note() {
    let config = host_config(256, 2, false);
    let mut backend = HostOffloadBackend::<f64>::new(config.array_size).unwrap();
    let outcome = run_benchmark(&mut backend, config.num_times).unwrap();
    let device = DeviceSummary { index: 0, name: "CPU".into(), driver: "n/a".into() };
    let report = BenchmarkReport::new(&config, backend.implementation(), device, &outcome);
    let mut out = Vec::new();
    report.write_table(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Function"), "{text}");
    assert_eq!(text.lines().count(), 5);
}

proptest! {
    #[test]
    fn builder_accepts_exactly_valid_sizes(array_size in 0_usize..1 << 20, num_times in 0_usize..8) {
        let result = RunConfig::builder()
            .array_size(Some(array_size))
            .num_times(Some(num_times))
            .build();
        if array_size > 0 && num_times >= 2 {
            let config = result.unwrap();
            prop_assert_eq!(config.array_size, array_size);
            prop_assert_eq!(config.num_times, num_times);
        } else {
            prop_assert!(matches!(result, Err(StreamError::InvalidConfiguration(_))));
        }
    }
}
