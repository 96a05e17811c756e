//! Error types for loss configuration and evaluation.

use alloc::string::String;
use core::fmt;
use decolle_tensor::Shape;

/// Errors from constructing or evaluating a [`DecolleLoss`](crate::DecolleLoss).
///
/// Every variant is a caller contract violation; nothing is retried or
/// recovered, the error propagates unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum DecolleError {
    /// Regularization strength was negative (or not finite). A negative
    /// strength would turn the penalty into a reward.
    NegativeRegularization(f64),
    /// Reduction string was neither "mean" nor "sum".
    UnknownReduction(String),
    /// The readout and voltage sequences have different lengths.
    LayerCountMismatch { readouts: usize, voltages: usize },
    /// A layer's readout is 0-dimensional, so it has no trailing time axis.
    MissingTimeAxis { layer: usize },
    /// A layer's readout has zero time steps under mean reduction, which
    /// would divide by zero.
    EmptyTimeAxis { layer: usize },
    /// A layer's per-step readout shape does not fit the target under the
    /// configured local loss. Surfaced up front so a wrong target is never
    /// silently broadcast or truncated into a plausible-looking loss.
    ShapeMismatch {
        layer: usize,
        pred: Shape,
        target: Shape,
    },
    /// A layer's voltage tensor has no elements while `reg > 0`; the penalty
    /// mean would be undefined.
    EmptyVoltage { layer: usize },
}

impl fmt::Display for DecolleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeRegularization(reg) => {
                write!(f, "regularization strength must be finite and >= 0, got {reg}")
            }
            Self::UnknownReduction(mode) => {
                write!(f, "unknown reduction mode {mode:?} (expected \"mean\" or \"sum\")")
            }
            Self::LayerCountMismatch { readouts, voltages } => {
                write!(
                    f,
                    "layer count mismatch: {readouts} readout tensors vs {voltages} voltage tensors"
                )
            }
            Self::MissingTimeAxis { layer } => {
                write!(f, "readout for layer {layer} is 0-dimensional and has no time axis")
            }
            Self::EmptyTimeAxis { layer } => {
                write!(
                    f,
                    "readout for layer {layer} has zero time steps under mean reduction"
                )
            }
            Self::ShapeMismatch {
                layer,
                pred,
                target,
            } => {
                write!(
                    f,
                    "layer {layer}: per-step readout shape {:?} is incompatible with target shape {:?}",
                    pred.dims(),
                    target.dims()
                )
            }
            Self::EmptyVoltage { layer } => {
                write!(
                    f,
                    "voltage for layer {layer} has no elements but regularization is enabled"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecolleError {}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_messages() {
        let e = DecolleError::LayerCountMismatch {
            readouts: 2,
            voltages: 1,
        };
        assert!(e.to_string().contains("2 readout"));
        assert!(e.to_string().contains("1 voltage"));

        let e = DecolleError::UnknownReduction("avg".to_string());
        assert!(e.to_string().contains("avg"));
    }
}
