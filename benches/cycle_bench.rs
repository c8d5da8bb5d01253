use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mnist_edge::{parse_sample, InferenceDriver, QuantMlp, QuantModel, RawSample};

fn bench_parse(c: &mut Criterion) {
    let line: String = (0..784).map(|i| ((i * 7) % 256).to_string()).collect::<Vec<_>>().join(" ");
    let mut s = RawSample::zeros();
    c.bench_function("parse_sample_784", |b| {
        b.iter(|| { parse_sample(black_box(line.as_bytes()), &mut s).ok(); })
    });
}

fn bench_infer(c: &mut Criterion) {
    // hidden size of a small on-device model
    let mut driver = match InferenceDriver::start(QuantMlp::new(QuantModel::random(32, 9))) {
        Ok(d) => d,
        Err(e) => panic!("driver start: {}", e),
    };
    let mut s = RawSample::zeros();
    for (i, p) in s.as_mut_bytes().iter_mut().enumerate() { *p = (i % 256) as u8; }
    c.bench_function("infer_784_32_10", |b| {
        b.iter(|| black_box(driver.infer(black_box(&s)).map(|c| c.prediction).unwrap_or(usize::MAX)))
    });
}

criterion_group!(benches, bench_parse, bench_infer);
criterion_main!(benches);
