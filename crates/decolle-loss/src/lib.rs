//! DECOLLE loss for training spiking neural networks with local, per-layer
//! credit assignment (Kaiser, Mostafa & Neftci, "Synaptic plasticity dynamics
//! for deep continuous local learning", 2020).
//!
//! Each layer produces a readout tensor shaped `[..., T]` (time axis last) and
//! a membrane-voltage tensor. The total loss is
//!
//! ```text
//! L = Σ_l Σ_t ℓ(r^l[..., t], y) + reg * ( ⟨relu(v^l + 0.01)⟩
//!                                       + 0.003 * ⟨relu(0.1 - σ(v^l))⟩ )
//! ```
//!
//! with an optional per-layer time average. The local loss ℓ is pluggable via
//! [`LocalLoss`]; [`Mse`], [`SmoothL1`] and [`CrossEntropy`] are provided.
//!
//! Gradients come two ways: evaluate with `Dual<f64>` tensors for forward-mode
//! derivatives, or call [`DecolleLoss::compute_with_grad`] for analytic
//! reverse-mode gradients w.r.t. every readout and voltage tensor.
//!
//! ```
//! use decolle_loss::{DecolleLoss, Mse, Reduction};
//! use decolle_tensor::Tensor;
//!
//! let loss = DecolleLoss::new(Mse, 0.0, Reduction::Mean).unwrap();
//! let readout = Tensor::from_slice(&[1.0_f64, 3.0]); // one unit, T = 2
//! let voltage = Tensor::from_slice(&[0.0]);
//! let target = Tensor::scalar(0.0);
//! let total = loss.compute(&[readout], &[voltage], &target).unwrap();
//! assert!((total - 5.0).abs() < 1e-12);
//! ```

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod aggregate;
mod error;
mod local;
mod reg;

pub use aggregate::{DecolleLoss, LossGrads, Reduction};
pub use error::DecolleError;
pub use local::{CrossEntropy, LocalLoss, Mse, SmoothL1};
pub use reg::{voltage_penalty, voltage_penalty_grad, FIRING_FLOOR, FLOOR_WEIGHT, VOLTAGE_MARGIN};
