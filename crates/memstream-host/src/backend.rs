//! Fork-join host kernels over double-precision flat arrays.

use std::marker::PhantomData;

use memstream_core::{
    HOST_SCALAR, Result, StreamBackend, StreamElement, StreamError, ensure_host_len,
};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

/// Implementation name reported by the driver.
pub const IMPLEMENTATION: &str = "Rayon host offload";

/// Smallest slice a rayon task is split down to.
const MIN_SPLIT: usize = 4096;

/// Host backend configuration.
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// Worker threads; `None` uses every available core.
    pub threads: Option<usize>,
}

/// STREAM backend running on the local host cores.
///
/// Storage is always `f64` whatever `T` is; transfers convert at the
/// boundary. Each kernel call returns only after every iteration of its
/// parallel loop has completed.
pub struct HostOffloadBackend<T: StreamElement> {
    array_size: usize,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    pool: ThreadPool,
    _marker: PhantomData<T>,
}

impl<T: StreamElement> HostOffloadBackend<T> {
    /// Allocate three `array_size`-element arrays on a pool spanning all cores.
    pub fn new(array_size: usize) -> Result<Self> {
        Self::with_config(array_size, HostConfig::default())
    }

    pub fn with_config(array_size: usize, config: HostConfig) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.threads.unwrap_or(0))
            .thread_name(|i| format!("memstream-host-{i}"))
            .build()
            .map_err(|e| StreamError::runtime("rayon thread pool", e))?;
        debug!(array_size, threads = pool.current_num_threads(), "host backend ready");

        Ok(Self {
            array_size,
            a: vec![0.0; array_size],
            b: vec![0.0; array_size],
            c: vec![0.0; array_size],
            pool,
            _marker: PhantomData,
        })
    }

    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl<T: StreamElement> StreamBackend<T> for HostOffloadBackend<T> {
    fn implementation(&self) -> &'static str {
        IMPLEMENTATION
    }

    fn array_size(&self) -> usize {
        self.array_size
    }

    fn scalar(&self) -> T {
        T::from_f64(HOST_SCALAR)
    }

    fn stored_element_bytes(&self) -> usize {
        size_of::<f64>()
    }

    fn copy(&mut self) -> Result<()> {
        let (a, c) = (&self.a, &mut self.c);
        self.pool.install(|| {
            c.par_iter_mut()
                .zip(a.par_iter())
                .with_min_len(MIN_SPLIT)
                .for_each(|(c, &a)| *c = a);
        });
        Ok(())
    }

    fn mul(&mut self) -> Result<()> {
        let (b, c) = (&mut self.b, &self.c);
        self.pool.install(|| {
            b.par_iter_mut()
                .zip(c.par_iter())
                .with_min_len(MIN_SPLIT)
                .for_each(|(b, &c)| *b = HOST_SCALAR * c);
        });
        Ok(())
    }

    fn add(&mut self) -> Result<()> {
        let (a, b, c) = (&self.a, &self.b, &mut self.c);
        self.pool.install(|| {
            c.par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .with_min_len(MIN_SPLIT)
                .for_each(|(c, (&a, &b))| *c = a + b);
        });
        Ok(())
    }

    fn triad(&mut self) -> Result<()> {
        let (a, b, c) = (&mut self.a, &self.b, &self.c);
        self.pool.install(|| {
            a.par_iter_mut()
                .zip(b.par_iter().zip(c.par_iter()))
                .with_min_len(MIN_SPLIT)
                .for_each(|(a, (&b, &c))| *a = b + HOST_SCALAR * c);
        });
        Ok(())
    }

    fn write_arrays(&mut self, a: &[T], b: &[T], c: &[T]) -> Result<()> {
        ensure_host_len('a', self.array_size, a.len())?;
        ensure_host_len('b', self.array_size, b.len())?;
        ensure_host_len('c', self.array_size, c.len())?;

        let pool = &self.pool;
        for (dst, src) in [(&mut self.a, a), (&mut self.b, b), (&mut self.c, c)] {
            pool.install(|| {
                dst.par_iter_mut().zip(src.par_iter()).for_each(|(d, &s)| *d = s.to_f64());
            });
        }
        Ok(())
    }

    fn read_arrays(&mut self, a: &mut [T], b: &mut [T], c: &mut [T]) -> Result<()> {
        ensure_host_len('a', self.array_size, a.len())?;
        ensure_host_len('b', self.array_size, b.len())?;
        ensure_host_len('c', self.array_size, c.len())?;

        let pool = &self.pool;
        for (dst, src) in [(a, &self.a), (b, &self.b), (c, &self.c)] {
            pool.install(|| {
                dst.par_iter_mut().zip(src.par_iter()).for_each(|(d, &s)| *d = T::from_f64(s));
            });
        }
        Ok(())
    }
}

impl<T: StreamElement> std::fmt::Debug for HostOffloadBackend<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostOffloadBackend")
            .field("array_size", &self.array_size)
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}
