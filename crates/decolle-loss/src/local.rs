//! Local loss functions applied per layer and per time step.

use alloc::vec::Vec;
use decolle_tensor::{Scalar, Shape, Tensor};

/// A differentiable loss applied independently to each layer's per-step
/// readout against the shared target.
///
/// Implementations come in value/gradient pairs: `loss` is the scalar value,
/// `grad` its analytic derivative w.r.t. `pred`. The aggregator uses both so
/// an external optimizer can backpropagate through the total loss.
pub trait LocalLoss<S: Scalar> {
    /// Scalar loss for one per-step prediction against the target.
    fn loss(&self, pred: &Tensor<S>, target: &Tensor<S>) -> S;

    /// Gradient of [`loss`](Self::loss) w.r.t. `pred`, same shape as `pred`.
    fn grad(&self, pred: &Tensor<S>, target: &Tensor<S>) -> Tensor<S>;

    /// Whether a per-step prediction of shape `pred` can be scored against
    /// `target`. The aggregator checks every layer up front and turns a `false`
    /// into a shape-mismatch error instead of broadcasting or panicking.
    fn compatible(&self, pred: &Shape, target: &Shape) -> bool;
}

/// Mean squared error: (1/n) * sum((pred - target)^2)
#[derive(Debug, Clone, Copy, Default)]
pub struct Mse;

impl<S: Scalar> LocalLoss<S> for Mse {
    fn loss(&self, pred: &Tensor<S>, target: &Tensor<S>) -> S {
        let diff = pred.sub(target);
        diff.mul(&diff).mean()
    }

    // (2/n) * (pred - target)
    fn grad(&self, pred: &Tensor<S>, target: &Tensor<S>) -> Tensor<S> {
        let n = S::from_f64(pred.numel() as f64);
        pred.sub(target).scale(S::TWO / n)
    }

    // Elementwise: the target must match the per-step shape exactly.
    fn compatible(&self, pred: &Shape, target: &Shape) -> bool {
        pred == target
    }
}

/// Smooth L1 (Huber) loss: quadratic for small errors, linear for large.
#[derive(Debug, Clone, Copy)]
pub struct SmoothL1 {
    pub delta: f64,
}

impl SmoothL1 {
    pub fn new(delta: f64) -> Self {
        Self { delta }
    }
}

impl<S: Scalar> LocalLoss<S> for SmoothL1 {
    fn loss(&self, pred: &Tensor<S>, target: &Tensor<S>) -> S {
        let delta = S::from_f64(self.delta);
        let diff = pred.sub(target);
        let n = S::from_f64(diff.numel() as f64);
        let mut total = S::ZERO;
        for &d in diff.data() {
            let a = d.abs();
            if a <= delta {
                total += S::HALF * d * d;
            } else {
                total += delta * (a - S::HALF * delta);
            }
        }
        total / n
    }

    fn grad(&self, pred: &Tensor<S>, target: &Tensor<S>) -> Tensor<S> {
        let delta = S::from_f64(self.delta);
        let n = S::from_f64(pred.numel() as f64);
        pred.sub(target).map(|d| {
            if d.abs() <= delta {
                d / n
            } else {
                delta * d.signum() / n
            }
        })
    }

    fn compatible(&self, pred: &Shape, target: &Shape) -> bool {
        pred == target
    }
}

/// Cross-entropy loss for classification readouts.
///
/// `pred`: `[batch, num_classes]` raw scores for one time step.
/// `target`: `[batch]` integer class indices (stored as S).
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossEntropy;

impl<S: Scalar> LocalLoss<S> for CrossEntropy {
    fn loss(&self, pred: &Tensor<S>, target: &Tensor<S>) -> S {
        assert_eq!(pred.ndim(), 2, "cross-entropy: pred must be [batch, classes]");
        assert_eq!(target.ndim(), 1, "cross-entropy: target must be [batch]");
        let batch = pred.shape()[0];
        let num_classes = pred.shape()[1];
        assert_eq!(target.shape()[0], batch);
        let mut total = S::ZERO;

        for b in 0..batch {
            // log-softmax for numerical stability
            let mut max_val = pred.get(&[b, 0]);
            for c in 1..num_classes {
                let v = pred.get(&[b, c]);
                if v > max_val {
                    max_val = v;
                }
            }
            let mut log_sum_exp = S::ZERO;
            for c in 0..num_classes {
                log_sum_exp += (pred.get(&[b, c]) - max_val).exp();
            }
            let log_sum_exp = max_val + log_sum_exp.ln();

            let target_class = target.get(&[b]).to_f64() as usize;
            let log_prob = pred.get(&[b, target_class]) - log_sum_exp;
            total -= log_prob;
        }
        total / S::from_f64(batch as f64)
    }

    // (softmax(pred) - one_hot(target)) / batch
    fn grad(&self, pred: &Tensor<S>, target: &Tensor<S>) -> Tensor<S> {
        assert_eq!(pred.ndim(), 2);
        assert_eq!(target.ndim(), 1);
        let batch = pred.shape()[0];
        let num_classes = pred.shape()[1];
        let batch_s = S::from_f64(batch as f64);

        // Precompute softmax rows
        let mut rows: Vec<Vec<S>> = Vec::with_capacity(batch);
        for b in 0..batch {
            let mut max_val = pred.get(&[b, 0]);
            for c in 1..num_classes {
                let v = pred.get(&[b, c]);
                if v > max_val {
                    max_val = v;
                }
            }
            let mut sum_exp = S::ZERO;
            let mut exps = Vec::with_capacity(num_classes);
            for c in 0..num_classes {
                let e = (pred.get(&[b, c]) - max_val).exp();
                sum_exp += e;
                exps.push(e);
            }
            for e in exps.iter_mut() {
                *e /= sum_exp;
            }
            rows.push(exps);
        }

        Tensor::from_fn(pred.shape().clone(), |idx| {
            let (b, c) = (idx[0], idx[1]);
            let target_class = target.get(&[b]).to_f64() as usize;
            let one_hot = if c == target_class { S::ONE } else { S::ZERO };
            (rows[b][c] - one_hot) / batch_s
        })
    }

    // [batch, classes] scores against [batch] class indices.
    fn compatible(&self, pred: &Shape, target: &Shape) -> bool {
        pred.ndim() == 2 && target.ndim() == 1 && pred[0] == target[0]
    }
}
