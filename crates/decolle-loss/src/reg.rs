//! Membrane-voltage regularization.
//!
//! A soft double-sided penalty on the per-layer voltage tensor: voltages above
//! a small positive margin are pushed down (non-saturation), units whose
//! firing probability sits below a floor are pushed up (no silent units).

use decolle_tensor::{Scalar, Tensor};

/// Voltages above `-VOLTAGE_MARGIN` start paying the upper penalty.
pub const VOLTAGE_MARGIN: f64 = 0.01;

/// Lower threshold on the logistic firing probability sigmoid(v).
pub const FIRING_FLOOR: f64 = 0.1;

/// Weight of the silent-unit term relative to the saturation term.
pub const FLOOR_WEIGHT: f64 = 3e-3;

/// Regularization penalty for one layer's voltage tensor:
///
/// `reg * mean(relu(v + 0.01)) + reg * 3e-3 * mean(relu(0.1 - sigmoid(v)))`
///
/// `voltage` must be non-empty; the aggregator rejects empty voltages before
/// calling this.
pub fn voltage_penalty<S: Scalar>(reg: f64, voltage: &Tensor<S>) -> S {
    let margin = S::from_f64(VOLTAGE_MARGIN);
    let floor = S::from_f64(FIRING_FLOOR);
    let saturation = voltage.map(|v| v + margin).relu().mean();
    let silence = voltage.sigmoid().map(|s| floor - s).relu().mean();
    S::from_f64(reg) * saturation + S::from_f64(reg * FLOOR_WEIGHT) * silence
}

/// Gradient of [`voltage_penalty`] w.r.t. each voltage element:
///
/// `reg/N * [v + 0.01 > 0] - reg*3e-3/N * [0.1 - sigmoid(v) > 0] * sigmoid'(v)`
pub fn voltage_penalty_grad<S: Scalar>(reg: f64, voltage: &Tensor<S>) -> Tensor<S> {
    let n = S::from_f64(voltage.numel() as f64);
    let margin = S::from_f64(VOLTAGE_MARGIN);
    let floor = S::from_f64(FIRING_FLOOR);
    let w_saturation = S::from_f64(reg) / n;
    let w_silence = S::from_f64(reg * FLOOR_WEIGHT) / n;
    voltage.map(|v| {
        let mut g = S::ZERO;
        if v + margin > S::ZERO {
            g += w_saturation;
        }
        let s = v.sigmoid();
        if floor - s > S::ZERO {
            g -= w_silence * s * (S::ONE - s);
        }
        g
    })
}
