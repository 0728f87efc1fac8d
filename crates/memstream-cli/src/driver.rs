//! Timed kernel loop and result validation.

use std::time::{Duration, Instant};

use memstream_core::{Kernel, Result, StreamBackend, StreamElement};
use tracing::{debug, warn};

/// Initial value of every element of `a`.
pub const INIT_A: f64 = 0.1;
pub const INIT_B: f64 = 0.2;
pub const INIT_C: f64 = 0.0;

/// Average absolute error allowed per array, in units of machine epsilon.
pub const TOLERANCE_EPSILONS: f64 = 100.0;

/// Wall-clock samples per kernel, one per iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timings {
    samples: [Vec<Duration>; 4],
}

impl Timings {
    pub fn with_capacity(iterations: usize) -> Self {
        Self { samples: std::array::from_fn(|_| Vec::with_capacity(iterations)) }
    }

    pub fn record(&mut self, kernel: Kernel, elapsed: Duration) {
        self.samples[slot(kernel)].push(elapsed);
    }

    pub fn samples(&self, kernel: Kernel) -> &[Duration] {
        &self.samples[slot(kernel)]
    }

    /// Samples after the warm-up iteration.
    pub fn measured(&self, kernel: Kernel) -> &[Duration] {
        self.samples(kernel).get(1..).unwrap_or_default()
    }
}

fn slot(kernel: Kernel) -> usize {
    match kernel {
        Kernel::Copy => 0,
        Kernel::Mul => 1,
        Kernel::Add => 2,
        Kernel::Triad => 3,
    }
}

/// Result of comparing the arrays read back against the scalar recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Validation {
    /// Expected final values of `a`, `b` and `c`.
    pub gold: [f64; 3],
    /// Average absolute error of `a`, `b` and `c`.
    pub errors: [f64; 3],
    pub tolerance: f64,
}

impl Validation {
    /// Replay `num_times` iterations of the four kernels on scalars with
    /// `scalar` as the multiplier.
    pub fn gold_values(scalar: f64, num_times: usize) -> [f64; 3] {
        replay([INIT_A, INIT_B, INIT_C], scalar, num_times)
    }

    /// Validate against a replay that starts from the initial values as
    /// stored in `T`.
    pub fn check<T: StreamElement>(scalar: T, num_times: usize, arrays: [&[T]; 3]) -> Self {
        let init = [INIT_A, INIT_B, INIT_C].map(|v| T::from_f64(v).to_f64());
        let gold = replay(init, scalar.to_f64(), num_times);
        let errors = std::array::from_fn(|i| average_error(arrays[i], T::from_f64(gold[i])));
        Self { gold, errors, tolerance: TOLERANCE_EPSILONS * T::EPSILON.to_f64() }
    }

    /// Arrays whose error is above tolerance (or not a number).
    pub fn failures(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        ['a', 'b', 'c']
            .into_iter()
            .zip(self.errors)
            .filter(|&(_, err)| !(err <= self.tolerance))
    }

    pub fn passed(&self) -> bool {
        self.failures().next().is_none()
    }
}

fn replay([mut a, mut b, mut c]: [f64; 3], scalar: f64, num_times: usize) -> [f64; 3] {
    for _ in 0..num_times {
        c = a;
        b = scalar * c;
        c = a + b;
        a = b + scalar * c;
    }
    [a, b, c]
}

fn average_error<T: StreamElement>(values: &[T], gold: T) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let gold = gold.to_f64();
    let sum: f64 = values
        .iter()
        .map(|v| {
            let v = v.to_f64();
            // Identical values count as exact, including overflowed ones.
            if v == gold { 0.0 } else { (v - gold).abs() }
        })
        .sum();
    sum / values.len() as f64
}

/// Everything a run produces besides the arrays themselves.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub timings: Timings,
    pub validation: Validation,
    /// Bytes per element the kernels streamed, from the backend's storage.
    pub stored_element_bytes: usize,
}

/// Initialise the arrays, run `num_times` iterations of copy, mul, add and
/// triad, read the arrays back and validate them.
pub fn run_benchmark<T, B>(backend: &mut B, num_times: usize) -> Result<RunOutcome>
where
    T: StreamElement,
    B: StreamBackend<T> + ?Sized,
{
    let n = backend.array_size();
    let mut a = vec![T::from_f64(INIT_A); n];
    let mut b = vec![T::from_f64(INIT_B); n];
    let mut c = vec![T::from_f64(INIT_C); n];
    backend.write_arrays(&a, &b, &c)?;

    let mut timings = Timings::with_capacity(num_times);
    for iteration in 0..num_times {
        for kernel in Kernel::ALL {
            let start = Instant::now();
            backend.run(kernel)?;
            timings.record(kernel, start.elapsed());
        }
        debug!(iteration, "kernels complete");
    }

    backend.read_arrays(&mut a, &mut b, &mut c)?;
    let validation = Validation::check(backend.scalar(), num_times, [&a[..], &b[..], &c[..]]);
    for (array, err) in validation.failures() {
        warn!(array = %array, error = err, tolerance = validation.tolerance, "validation failed");
    }

    Ok(RunOutcome { timings, validation, stored_element_bytes: backend.stored_element_bytes() })
}
