use criterion::{black_box, criterion_group, criterion_main, Criterion};
use decolle_loss::{DecolleLoss, Mse, Reduction};
use decolle_tensor::{Shape, Tensor};

/// Deterministic synthetic spike-train readout: [units, T].
fn readout(units: usize, steps: usize, phase: f64) -> Tensor<f64> {
    Tensor::from_fn(Shape::from_slice(&[units, steps]), |idx| {
        ((idx[0] * steps + idx[1]) as f64 * 0.37 + phase).sin()
    })
}

fn voltage(units: usize, phase: f64) -> Tensor<f64> {
    Tensor::from_fn(Shape::from_slice(&[units]), |idx| {
        (idx[0] as f64 * 0.73 + phase).cos() * 2.0
    })
}

fn three_layer_workload() -> (Vec<Tensor<f64>>, Vec<Tensor<f64>>, Tensor<f64>) {
    // The target is shared across layers, so every readout layer has the
    // same unit count.
    let steps = 32;
    let readouts: Vec<_> = (0..3).map(|l| readout(64, steps, l as f64)).collect();
    let voltages: Vec<_> = (0..3).map(|l| voltage(64, l as f64 + 0.5)).collect();
    let target = Tensor::from_fn(Shape::from_slice(&[64]), |idx| {
        if idx[0] % 7 == 0 {
            1.0
        } else {
            0.0
        }
    });
    (readouts, voltages, target)
}

fn bench_compute(c: &mut Criterion) {
    let (readouts, voltages, target) = three_layer_workload();
    let loss = DecolleLoss::new(Mse, 0.1, Reduction::Mean).unwrap();

    let mut group = c.benchmark_group("decolle");
    group.bench_function("compute", |b| {
        b.iter(|| {
            black_box(
                loss.compute(black_box(&readouts), black_box(&voltages), black_box(&target))
                    .unwrap(),
            )
        })
    });
    group.bench_function("compute_with_grad", |b| {
        b.iter(|| {
            black_box(
                loss.compute_with_grad(
                    black_box(&readouts),
                    black_box(&voltages),
                    black_box(&target),
                )
                .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
