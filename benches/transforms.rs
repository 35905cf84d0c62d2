use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use parafx::{EngineConfig, PixelBuffer, Transform, Workers};

fn test_card(size: u32) -> PixelBuffer {
    PixelBuffer::from_fn(size, size, |x, y| [(x ^ y) as u8, (x * 3) as u8, (y * 5) as u8, 255])
        .expect("non-empty card")
}

fn bench_transforms(c: &mut Criterion) {
    let src = test_card(256);
    let configs = [
        ("sequential", EngineConfig::new(Workers::sequential())),
        ("default", EngineConfig::default()),
    ];

    let mut group = c.benchmark_group("transforms_256");
    for t in [Transform::Grayscale, Transform::Smooth, Transform::Gaussian, Transform::Sharpen] {
        for (name, config) in &configs {
            group.bench_with_input(BenchmarkId::new(t.name(), name), config, |b, config| {
                b.iter(|| t.apply(&src, config).expect("transform"))
            });
        }
    }
    group.finish();

    // Direct-summation DFT is quadratic per axis; keep the image small.
    let small = test_card(48);
    let mut group = c.benchmark_group("spectrum_48");
    group.sample_size(10);
    for (name, config) in &configs {
        group.bench_with_input(BenchmarkId::from_parameter(name), config, |b, config| {
            b.iter(|| Transform::Spectrum.apply(&small, config).expect("spectrum"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_transforms);
criterion_main!(benches);
