use crate::{Scalar, Shape};
use alloc::vec::Vec;

/// Dense row-major tensor with the time axis last.
///
/// Storage is always contiguous, so for a shape `[..., T]` the T values of one
/// unit sit `T` apart and `time_slice` is a strided gather.
#[derive(Debug, Clone)]
pub struct Tensor<S: Scalar> {
    data: Vec<S>,
    shape: Shape,
    strides: Vec<usize>,
}

impl<S: Scalar> Tensor<S> {
    /// Create a tensor from flat row-major data and shape.
    pub fn new(data: Vec<S>, shape: Shape) -> Self {
        let strides = shape.contiguous_strides();
        debug_assert_eq!(data.len(), shape.numel());
        Self {
            data,
            shape,
            strides,
        }
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.numel();
        Self::new(alloc::vec![S::ZERO; n], shape)
    }

    /// Create a tensor from a closure over multi-indices.
    pub fn from_fn(shape: Shape, f: impl Fn(&[usize]) -> S) -> Self {
        let n = shape.numel();
        let ndim = shape.ndim();
        let mut data = Vec::with_capacity(n);
        let mut idx = alloc::vec![0usize; ndim];

        for _ in 0..n {
            data.push(f(&idx));
            // Increment multi-index
            for d in (0..ndim).rev() {
                idx[d] += 1;
                if idx[d] < shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self::new(data, shape)
    }

    /// 0-dimensional tensor holding a single value.
    pub fn scalar(val: S) -> Self {
        Self::new(alloc::vec![val], Shape::scalar())
    }

    /// 1-D tensor from slice.
    pub fn from_slice(s: &[S]) -> Self {
        Self::new(s.to_vec(), Shape::from_slice(&[s.len()]))
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }
    pub fn data(&self) -> &[S] {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut [S] {
        &mut self.data
    }

    /// Flat index from multi-index.
    fn flat_index(&self, idx: &[usize]) -> usize {
        debug_assert_eq!(idx.len(), self.ndim());
        idx.iter()
            .zip(self.strides.iter())
            .map(|(i, s)| i * s)
            .sum()
    }

    /// Get element by multi-index.
    pub fn get(&self, idx: &[usize]) -> S {
        self.data[self.flat_index(idx)]
    }

    /// Set element by multi-index.
    pub fn set(&mut self, idx: &[usize], val: S) {
        let fi = self.flat_index(idx);
        self.data[fi] = val;
    }

    // --- Time axis ---

    /// Length of the trailing time axis. Panics on a 0-dimensional tensor;
    /// callers that need to reject those gracefully check `ndim()` first.
    pub fn time_steps(&self) -> usize {
        let (_, steps) = self
            .shape
            .split_time()
            .expect("time_steps: tensor has no time axis");
        steps
    }

    /// Extract the per-step tensor at time index `t`: `[..., T]` -> `[...]`.
    pub fn time_slice(&self, t: usize) -> Self {
        let (lead, steps) = self
            .shape
            .split_time()
            .expect("time_slice: tensor has no time axis");
        assert!(t < steps, "time_slice: index {t} out of range (T = {steps})");
        let n = lead.numel();
        let mut data = Vec::with_capacity(n);
        for i in 0..n {
            data.push(self.data[i * steps + t]);
        }
        Self::new(data, lead)
    }

    /// Overwrite the per-step values at time index `t`.
    pub fn set_time_slice(&mut self, t: usize, step: &Tensor<S>) {
        let (lead, steps) = self
            .shape
            .split_time()
            .expect("set_time_slice: tensor has no time axis");
        assert!(
            t < steps,
            "set_time_slice: index {t} out of range (T = {steps})"
        );
        assert_eq!(
            step.shape(),
            &lead,
            "set_time_slice: step shape must match the per-step shape"
        );
        let n = lead.numel();
        for i in 0..n {
            self.data[i * steps + t] = step.data[i];
        }
    }

    /// Build a time-last tensor `[..., N]` from N per-step tensors of equal
    /// shape, in order.
    pub fn stack_time(steps: &[&Tensor<S>]) -> Self {
        assert!(!steps.is_empty(), "stack_time: need at least one step");
        let inner = steps[0].shape();
        for s in &steps[1..] {
            assert_eq!(s.shape(), inner, "stack_time: all steps must share a shape");
        }

        let t_len = steps.len();
        let mut dims = inner.dims().to_vec();
        dims.push(t_len);
        let n = inner.numel();
        let mut data = Vec::with_capacity(n * t_len);
        for i in 0..n {
            for s in steps {
                data.push(s.data[i]);
            }
        }
        Self::new(data, Shape::new(dims))
    }

    // --- Element-wise operations ---

    /// Apply element-wise unary operation.
    pub fn map(&self, f: impl Fn(S) -> S) -> Self {
        let data: Vec<S> = self.data.iter().map(|&v| f(v)).collect();
        Self::new(data, self.shape.clone())
    }

    /// Element-wise binary operation with broadcasting.
    pub fn zip_with(&self, other: &Self, f: impl Fn(S, S) -> S) -> Self {
        if self.shape == other.shape {
            // Fast path: same shape
            let data: Vec<S> = self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect();
            return Self::new(data, self.shape.clone());
        }

        let out_shape = Shape::broadcast(&self.shape, &other.shape)
            .expect("zip_with: incompatible shapes for broadcasting");

        Self::from_fn(out_shape, |idx| {
            let a = self.broadcast_get(idx);
            let b = other.broadcast_get(idx);
            f(a, b)
        })
    }

    /// Get element with broadcasting (index may be larger than shape).
    fn broadcast_get(&self, idx: &[usize]) -> S {
        let nd = self.ndim();
        let offset = idx.len() - nd;
        let mut fi = 0;
        for d in 0..nd {
            let i = idx[d + offset];
            let actual_i = if self.shape[d] == 1 { 0 } else { i };
            fi += actual_i * self.strides[d];
        }
        self.data[fi]
    }

    // --- Arithmetic ---

    pub fn add(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a - b)
    }

    pub fn mul(&self, other: &Self) -> Self {
        self.zip_with(other, |a, b| a * b)
    }

    pub fn scale(&self, s: S) -> Self {
        self.map(|v| v * s)
    }

    // --- Nonlinearities ---

    /// ReLU: max(x, 0).
    pub fn relu(&self) -> Self {
        self.map(|v| v.max(S::ZERO))
    }

    /// Logistic sigmoid.
    pub fn sigmoid(&self) -> Self {
        self.map(|v| v.sigmoid())
    }

    // --- Reductions ---

    /// Sum all elements.
    pub fn sum(&self) -> S {
        self.data.iter().copied().fold(S::ZERO, |a, b| a + b)
    }

    /// Mean of all elements.
    pub fn mean(&self) -> S {
        self.sum() / S::from_f64(self.numel() as f64)
    }
}
