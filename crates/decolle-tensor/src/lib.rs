//! Tensor foundation for DECOLLE-style spiking network training.
//!
//! Readouts in this domain are time-last arrays `[..., T]`: arbitrary leading
//! dimensions (batch, classes) and a trailing time axis. This crate provides a
//! small contiguous tensor type with the time-axis operations that convention
//! needs, generic over a `Scalar` type so the same code runs on f32, f64, or
//! `Dual<S>` for forward-mode differentiation.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

mod dual;
mod scalar;
mod shape;
mod tensor;

pub use dual::Dual;
pub use scalar::Scalar;
pub use shape::Shape;
pub use tensor::Tensor;
