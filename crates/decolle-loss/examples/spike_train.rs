//! Evaluate the DECOLLE loss on synthetic spike-train readouts and drive the
//! readouts toward the target with plain gradient descent on the analytic
//! gradients.
//!
//! Run with: cargo run --example spike_train

use decolle_loss::{DecolleLoss, Mse, Reduction};
use decolle_tensor::{Shape, Tensor};

const UNITS: usize = 8;
const STEPS: usize = 20;
const LAYERS: usize = 2;

fn main() {
    // Per-step readouts stacked into time-last [UNITS, STEPS] tensors.
    let mut readouts: Vec<Tensor<f64>> = (0..LAYERS)
        .map(|layer| {
            let steps: Vec<Tensor<f64>> = (0..STEPS)
                .map(|t| {
                    Tensor::from_fn(Shape::from_slice(&[UNITS]), |idx| {
                        ((idx[0] + t) as f64 * 0.61 + layer as f64).sin()
                    })
                })
                .collect();
            let refs: Vec<&Tensor<f64>> = steps.iter().collect();
            Tensor::stack_time(&refs)
        })
        .collect();

    let voltages: Vec<Tensor<f64>> = (0..LAYERS)
        .map(|layer| {
            Tensor::from_fn(Shape::from_slice(&[UNITS]), |idx| {
                (idx[0] as f64 * 0.37 - layer as f64 * 0.5).cos() * 1.5
            })
        })
        .collect();

    // One-hot-ish target shared by every layer and time step.
    let target = Tensor::from_fn(Shape::from_slice(&[UNITS]), |idx| {
        if idx[0] == 3 {
            1.0
        } else {
            0.0
        }
    });

    let loss = DecolleLoss::new(Mse, 0.05, Reduction::Mean).expect("valid config");
    let lr = 0.5;

    for step in 0..10 {
        let grads = loss
            .compute_with_grad(&readouts, &voltages, &target)
            .expect("aligned inputs");
        println!("step {:2}: loss = {:.6}", step, grads.loss);

        for (r, g) in readouts.iter_mut().zip(grads.readouts.iter()) {
            *r = r.sub(&g.scale(lr));
        }
    }

    let final_loss = loss
        .compute(&readouts, &voltages, &target)
        .expect("aligned inputs");
    println!("final:   loss = {final_loss:.6}");
}
