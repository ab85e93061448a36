use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pairhmm::batch::{fill_batch, Batch, ProbabilityModel, SequenceSource, SynthConfig};
use pairhmm::forward::ForwardEngine;
use pairhmm::workload::Geometry;
use pairhmm::{Decimal, Numeric, Posit32};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
const SEED: u64 = 1293890;
const READ_LEN: usize = 64;
const HAPL_LEN: usize = 128;

fn batch() -> Batch {
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(SEED);
    let read = pairhmm::gen_seq::generate_seq(&mut rng, 256);
    let hapl = pairhmm::gen_seq::generate_seq(&mut rng, 256);
    let config = SynthConfig::new(
        2f64,
        SequenceSource::Supplied { read, hapl },
        ProbabilityModel::Random { seed: SEED },
    );
    fill_batch(0, Geometry::new(READ_LEN, HAPL_LEN), &config)
}

fn forward_pair<T: Numeric>(c: &mut Criterion, batch: &Batch) {
    let engine = ForwardEngine::<T>::default();
    c.bench_function(&format!("forward_{}", T::NAME), |b| {
        b.iter(|| engine.calculate_pair(black_box(batch), 0, READ_LEN, HAPL_LEN))
    });
}

fn forward(c: &mut Criterion) {
    let batch = batch();
    forward_pair::<f32>(c, &batch);
    forward_pair::<Posit32>(c, &batch);
    forward_pair::<Decimal>(c, &batch);
}

fn posit_ops(c: &mut Criterion) {
    let (x, y) = (Posit32::from_f64(0.3), Posit32::from_f64(1.7e-5));
    c.bench_function("posit_mul_add", |b| {
        b.iter(|| black_box(x) * black_box(y) + black_box(x))
    });
    c.bench_function("posit_div", |b| b.iter(|| black_box(x) / black_box(y)));
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(20);
    targets = forward, posit_ops
}
criterion_main!(benches);
