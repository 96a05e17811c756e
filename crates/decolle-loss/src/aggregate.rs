//! The DECOLLE loss aggregator.

use crate::error::DecolleError;
use crate::local::LocalLoss;
use crate::reg::{voltage_penalty, voltage_penalty_grad};
use alloc::string::ToString;
use alloc::vec::Vec;
use core::str::FromStr;
use decolle_tensor::{Scalar, Tensor};

/// Whether per-layer time-step losses are summed or time-averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Reduction {
    /// Divide each per-timestep loss by the layer's step count T.
    Mean,
    /// Accumulate per-timestep losses as-is.
    Sum,
}

impl Reduction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
        }
    }
}

impl FromStr for Reduction {
    type Err = DecolleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean" => Ok(Self::Mean),
            "sum" => Ok(Self::Sum),
            other => Err(DecolleError::UnknownReduction(other.to_string())),
        }
    }
}

impl core::fmt::Display for Reduction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar loss plus analytic gradients w.r.t. every input tensor.
#[derive(Debug, Clone)]
pub struct LossGrads<S: Scalar> {
    /// Total loss over all layers and time steps.
    pub loss: S,
    /// Gradient w.r.t. each readout tensor, same shapes as the inputs.
    pub readouts: Vec<Tensor<S>>,
    /// Gradient w.r.t. each voltage tensor, same shapes as the inputs.
    pub voltages: Vec<Tensor<S>>,
}

/// DECOLLE loss: the sum over layers and time steps of a local loss on each
/// per-step readout slice, plus a voltage regularization penalty.
///
/// For readouts `r^l` of shape `[..., T_l]`, voltages `v^l` and target `y`:
///
/// ```text
/// L = Σ_l Σ_t w_l * ( local(r^l[..., t], y) + penalty(reg, v^l) )
/// ```
///
/// where `w_l = 1/T_l` under [`Reduction::Mean`] and `1` under
/// [`Reduction::Sum`], and the penalty term is present only when `reg > 0`.
/// Note the mean normalization is per step, applied to the penalty as well, so
/// under `Mean` the penalty contributes once per layer and under `Sum` it
/// contributes `T_l` times. This mirrors the published DECOLLE formulation.
///
/// The aggregator holds only its configuration; evaluation is a pure function
/// of its inputs.
#[derive(Debug, Clone)]
pub struct DecolleLoss<L> {
    local: L,
    reg: f64,
    reduction: Reduction,
}

impl<L> DecolleLoss<L> {
    /// Create an aggregator. Fails if `reg` is negative or not finite.
    /// `reg = 0` disables regularization entirely.
    pub fn new(local: L, reg: f64, reduction: Reduction) -> Result<Self, DecolleError> {
        if !(reg >= 0.0 && reg.is_finite()) {
            return Err(DecolleError::NegativeRegularization(reg));
        }
        Ok(Self {
            local,
            reg,
            reduction,
        })
    }

    pub fn reg(&self) -> f64 {
        self.reg
    }

    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Validate the per-call contract shared by `compute` and
    /// `compute_with_grad`. Returns the step count per layer, or None for an
    /// empty layer that sum reduction skips.
    fn layer_steps<S: Scalar>(
        &self,
        readouts: &[Tensor<S>],
        voltages: &[Tensor<S>],
        target: &Tensor<S>,
    ) -> Result<Vec<Option<usize>>, DecolleError>
    where
        L: LocalLoss<S>,
    {
        if readouts.len() != voltages.len() {
            return Err(DecolleError::LayerCountMismatch {
                readouts: readouts.len(),
                voltages: voltages.len(),
            });
        }
        let mut steps = Vec::with_capacity(readouts.len());
        for (layer, (r, v)) in readouts.iter().zip(voltages.iter()).enumerate() {
            let Some((lead, t_len)) = r.shape().split_time() else {
                return Err(DecolleError::MissingTimeAxis { layer });
            };
            if !self.local.compatible(&lead, target.shape()) {
                return Err(DecolleError::ShapeMismatch {
                    layer,
                    pred: lead,
                    target: target.shape().clone(),
                });
            }
            if self.reg > 0.0 && v.numel() == 0 {
                return Err(DecolleError::EmptyVoltage { layer });
            }
            match t_len {
                0 => match self.reduction {
                    Reduction::Mean => return Err(DecolleError::EmptyTimeAxis { layer }),
                    Reduction::Sum => steps.push(None),
                },
                t => steps.push(Some(t)),
            }
        }
        Ok(steps)
    }

    /// Total loss over all layers and time steps.
    ///
    /// `readouts` and `voltages` are paired by position (one pair per layer);
    /// `target` is shared by every layer and time step. The computation is
    /// generic over `S`, so evaluating with `Dual<f64>` inputs propagates
    /// forward-mode derivatives through the whole accumulation.
    pub fn compute<S: Scalar>(
        &self,
        readouts: &[Tensor<S>],
        voltages: &[Tensor<S>],
        target: &Tensor<S>,
    ) -> Result<S, DecolleError>
    where
        L: LocalLoss<S>,
    {
        let steps = self.layer_steps(readouts, voltages, target)?;

        let mut total = S::ZERO;
        for (layer, t_len) in steps.into_iter().enumerate() {
            let Some(t_len) = t_len else { continue };
            let (r, v) = (&readouts[layer], &voltages[layer]);

            let penalty = if self.reg > 0.0 {
                voltage_penalty(self.reg, v)
            } else {
                S::ZERO
            };
            let weight = match self.reduction {
                Reduction::Mean => S::from_f64(1.0 / t_len as f64),
                Reduction::Sum => S::ONE,
            };

            for t in 0..t_len {
                let slice = r.time_slice(t);
                let loss_t = self.local.loss(&slice, target) + penalty;
                total += loss_t * weight;
            }
        }
        Ok(total)
    }

    /// Total loss plus analytic gradients w.r.t. every readout and voltage
    /// tensor, for reverse-mode training loops that consume value/gradient
    /// pairs.
    ///
    /// An empty layer under sum reduction contributes zero loss and zero
    /// gradients, keeping the output vectors aligned with the inputs.
    pub fn compute_with_grad<S: Scalar>(
        &self,
        readouts: &[Tensor<S>],
        voltages: &[Tensor<S>],
        target: &Tensor<S>,
    ) -> Result<LossGrads<S>, DecolleError>
    where
        L: LocalLoss<S>,
    {
        let steps = self.layer_steps(readouts, voltages, target)?;

        let mut total = S::ZERO;
        let mut readout_grads = Vec::with_capacity(readouts.len());
        let mut voltage_grads = Vec::with_capacity(voltages.len());

        for (layer, t_len) in steps.into_iter().enumerate() {
            let (r, v) = (&readouts[layer], &voltages[layer]);
            let Some(t_len) = t_len else {
                readout_grads.push(Tensor::zeros(r.shape().clone()));
                voltage_grads.push(Tensor::zeros(v.shape().clone()));
                continue;
            };

            let penalty = if self.reg > 0.0 {
                voltage_penalty(self.reg, v)
            } else {
                S::ZERO
            };
            let weight = match self.reduction {
                Reduction::Mean => S::from_f64(1.0 / t_len as f64),
                Reduction::Sum => S::ONE,
            };

            let mut g_r = Tensor::zeros(r.shape().clone());
            for t in 0..t_len {
                let slice = r.time_slice(t);
                total += (self.local.loss(&slice, target) + penalty) * weight;
                g_r.set_time_slice(t, &self.local.grad(&slice, target).scale(weight));
            }
            readout_grads.push(g_r);

            // The penalty enters once per time step with weight w, so its
            // gradient is scaled by T * w: T under sum, 1 under mean.
            if self.reg > 0.0 {
                let scale = S::from_f64(t_len as f64) * weight;
                voltage_grads.push(voltage_penalty_grad(self.reg, v).scale(scale));
            } else {
                voltage_grads.push(Tensor::zeros(v.shape().clone()));
            }
        }

        Ok(LossGrads {
            loss: total,
            readouts: readout_grads,
            voltages: voltage_grads,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::Mse;
    use decolle_tensor::Shape;

    fn mse_mean(reg: f64) -> DecolleLoss<Mse> {
        DecolleLoss::new(Mse, reg, Reduction::Mean).unwrap()
    }

    #[test]
    fn reduction_parses_boundary_strings() {
        assert_eq!("mean".parse::<Reduction>().unwrap(), Reduction::Mean);
        assert_eq!("sum".parse::<Reduction>().unwrap(), Reduction::Sum);
        assert!(matches!(
            "avg".parse::<Reduction>(),
            Err(DecolleError::UnknownReduction(_))
        ));
        assert_eq!(Reduction::Mean.as_str(), "mean");
    }

    #[test]
    fn negative_reg_rejected() {
        assert!(matches!(
            DecolleLoss::new(Mse, -0.1, Reduction::Sum),
            Err(DecolleError::NegativeRegularization(_))
        ));
        assert!(matches!(
            DecolleLoss::new(Mse, f64::NAN, Reduction::Sum),
            Err(DecolleError::NegativeRegularization(_))
        ));
        assert!(DecolleLoss::new(Mse, 0.0, Reduction::Sum).is_ok());
    }

    #[test]
    fn penalty_counts_once_per_step_under_sum() {
        // With a constant readout equal to the target the local loss is zero,
        // so sum mode totals T * penalty and mean mode totals penalty.
        let r = Tensor::from_slice(&[2.0, 2.0, 2.0, 2.0]);
        let v = Tensor::from_slice(&[0.0]);
        let target = Tensor::scalar(2.0);
        let reg = 1.5;

        let per_layer_penalty = reg * 0.01; // see reg.rs tests

        let sum = DecolleLoss::new(Mse, reg, Reduction::Sum).unwrap();
        let total: f64 = sum.compute(&[r.clone()], &[v.clone()], &target).unwrap();
        assert!((total - 4.0 * per_layer_penalty).abs() < 1e-12);

        let mean = mse_mean(reg);
        let total: f64 = mean.compute(&[r], &[v], &target).unwrap();
        assert!((total - per_layer_penalty).abs() < 1e-12);
    }

    #[test]
    fn empty_layer_skipped_under_sum_but_rejected_under_mean() {
        let empty = Tensor::<f64>::zeros(Shape::from_slice(&[3, 0]));
        let v = Tensor::from_slice(&[0.0]);
        let target = Tensor::zeros(Shape::from_slice(&[3]));

        let sum = DecolleLoss::new(Mse, 0.0, Reduction::Sum).unwrap();
        let total = sum.compute(&[empty.clone()], &[v.clone()], &target).unwrap();
        assert_eq!(total, 0.0);

        let grads = sum
            .compute_with_grad(&[empty.clone()], &[v.clone()], &target)
            .unwrap();
        assert_eq!(grads.readouts.len(), 1);
        assert_eq!(grads.readouts[0].shape().dims(), &[3, 0]);

        let mean = mse_mean(0.0);
        assert_eq!(
            mean.compute(&[empty], &[v], &target),
            Err(DecolleError::EmptyTimeAxis { layer: 0 })
        );
    }

    #[test]
    fn empty_voltage_rejected_when_regularized() {
        // A zero-element voltage has no mean; with reg > 0 this must be an
        // error, not a NaN total.
        let r = Tensor::from_slice(&[1.0_f64, 2.0]);
        let empty_v = Tensor::<f64>::zeros(Shape::from_slice(&[0]));
        let target = Tensor::scalar(0.0);

        let regularized = mse_mean(0.5);
        assert_eq!(
            regularized.compute(&[r.clone()], &[empty_v.clone()], &target),
            Err(DecolleError::EmptyVoltage { layer: 0 })
        );
        assert!(regularized
            .compute_with_grad(&[r.clone()], &[empty_v.clone()], &target)
            .is_err());

        // With reg = 0 the voltage is never touched, so an empty one is fine.
        let unregularized = mse_mean(0.0);
        let total = unregularized.compute(&[r], &[empty_v], &target).unwrap();
        assert!(total.is_finite());
    }

    #[test]
    fn broadcastable_target_mismatch_rejected() {
        // Target [3, 1] would broadcast against a [3] per-step slice into a
        // [3, 3] comparison; that must surface as an error instead.
        let r = Tensor::<f64>::zeros(Shape::from_slice(&[3, 2]));
        let v = Tensor::from_slice(&[0.0]);
        let target = Tensor::<f64>::zeros(Shape::from_slice(&[3, 1]));

        let loss = mse_mean(0.0);
        let expected = Err(DecolleError::ShapeMismatch {
            layer: 0,
            pred: Shape::from_slice(&[3]),
            target: Shape::from_slice(&[3, 1]),
        });
        assert_eq!(loss.compute(&[r.clone()], &[v.clone()], &target), expected);
        assert_eq!(
            loss.compute_with_grad(&[r], &[v], &target).map(|g| g.loss),
            expected
        );
    }

    #[test]
    fn mismatch_reports_offending_layer() {
        let good = Tensor::<f64>::zeros(Shape::from_slice(&[2, 4]));
        let bad = Tensor::<f64>::zeros(Shape::from_slice(&[3, 4]));
        let v = Tensor::from_slice(&[0.0]);
        let target = Tensor::from_slice(&[0.0, 0.0]);

        let loss = mse_mean(0.0);
        assert_eq!(
            loss.compute(&[good, bad], &[v.clone(), v], &target),
            Err(DecolleError::ShapeMismatch {
                layer: 1,
                pred: Shape::from_slice(&[3]),
                target: Shape::from_slice(&[2]),
            })
        );
    }

    #[test]
    fn scalar_readout_rejected() {
        let r = Tensor::scalar(1.0_f64);
        let v = Tensor::from_slice(&[0.0]);
        let target = Tensor::scalar(0.0);
        let loss = mse_mean(0.0);
        assert_eq!(
            loss.compute(&[r], &[v], &target),
            Err(DecolleError::MissingTimeAxis { layer: 0 })
        );
    }
}
