use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use memstream_core::{Kernel, StreamBackend};
use memstream_host::HostOffloadBackend;

const N: usize = 1 << 22;

fn benchmark_host_kernels(c: &mut Criterion) {
    let mut backend = HostOffloadBackend::<f64>::new(N).unwrap();
    backend.write_arrays(&vec![0.1; N], &vec![0.2; N], &vec![0.0; N]).unwrap();

    let mut group = c.benchmark_group("host_kernels");
    for kernel in Kernel::ALL {
        let bytes = (kernel.arrays_touched() * size_of::<f64>() * N) as u64;
        group.throughput(Throughput::Bytes(bytes));
        group.bench_function(kernel.name(), |b| {
            b.iter(|| black_box(backend.run(black_box(kernel))))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_host_kernels);
criterion_main!(benches);
