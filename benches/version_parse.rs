use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dirauth::dialect::{CapabilityPolicy, VersionInfo};

const SAMPLES: &[&str] = &[
    "8.0.36-0ubuntu0.22.04.1",
    "5.7.44-log",
    "10.2.2-MariaDB",
    "5.5.5-10.11.6-MariaDB-1:10.11.6+maria~ubu2204",
    "not-a-version-string",
];

fn bench_version(c: &mut Criterion) {
    let mut group = c.benchmark_group("server_version");
    group.throughput(Throughput::Elements(SAMPLES.len() as u64));

    group.bench_function(BenchmarkId::new("parse", SAMPLES.len()), |b| {
        b.iter(|| {
            for raw in SAMPLES {
                criterion::black_box(VersionInfo::parse(raw).ok());
            }
        });
    });

    // Policy is built once per connection pool in practice
    let policy = CapabilityPolicy::default();
    group.bench_function(BenchmarkId::new("supports_recursive_query", SAMPLES.len()), |b| {
        b.iter(|| {
            let mut n = 0usize;
            for raw in SAMPLES {
                if policy.supports_recursive_query(raw) { n += 1; }
            }
            criterion::black_box(n);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_version);
criterion_main!(benches);
