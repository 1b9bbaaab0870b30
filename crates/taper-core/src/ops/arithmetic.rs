//! Element-wise arithmetic operations on tensors.

use crate::error::TaperError;
use crate::dtype::DType;
use crate::tensor::Tensor;
use crate::Result;

impl Tensor {
    /// Element-wise addition: self + other.
    pub fn add(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a + b)
    }

    /// Element-wise subtraction: self - other.
    pub fn sub(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a - b)
    }

    /// Element-wise multiplication: self * other.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a * b)
    }

    /// Element-wise division: self / other.
    pub fn div(&self, other: &Tensor) -> Result<Tensor> {
        binary_op(self, other, |a, b| a / b)
    }

    /// Element-wise negation: -self.
    pub fn neg(&self) -> Result<Tensor> {
        unary_op(self, |a| -a)
    }

    /// Element-wise exponential: e^self.
    pub fn exp(&self) -> Result<Tensor> {
        unary_op(self, |a| a.exp())
    }

    /// Element-wise natural logarithm.
    pub fn log(&self) -> Result<Tensor> {
        unary_op(self, |a| a.ln())
    }

    /// Element-wise power: self^exponent.
    pub fn pow_scalar(&self, exponent: f32) -> Result<Tensor> {
        unary_op(self, |a| a.powf(exponent))
    }

    /// Scalar addition: self + scalar.
    pub fn add_scalar(&self, scalar: f32) -> Result<Tensor> {
        unary_op(self, |a| a + scalar)
    }

    /// Scalar multiplication: self * scalar.
    pub fn mul_scalar(&self, scalar: f32) -> Result<Tensor> {
        unary_op(self, |a| a * scalar)
    }
}

/// Apply a unary operation element-wise (f32 only).
fn unary_op(a: &Tensor, op: impl Fn(f32) -> f32) -> Result<Tensor> {
    let a_data = a
        .as_f32_slice()
        .ok_or(TaperError::UnsupportedDType(a.dtype()))?;
    let result: Vec<f32> = a_data.iter().map(|&v| op(v)).collect();
    Ok(Tensor::from_f32(&result, a.dims()))
}

/// Apply a binary operation element-wise with broadcasting (f32 only).
fn binary_op(a: &Tensor, b: &Tensor, op: impl Fn(f32, f32) -> f32) -> Result<Tensor> {
    if a.dtype() != DType::F32 || b.dtype() != DType::F32 {
        return Err(TaperError::DTypeMismatch {
            expected: a.dtype(),
            got: b.dtype(),
        });
    }

    let out_shape = a.shape().broadcast_with(b.shape()).ok_or_else(|| {
        TaperError::BroadcastError {
            a: a.dims().to_vec(),
            b: b.dims().to_vec(),
        }
    })?;

    let numel = out_shape.numel();
    let a_data = a.as_f32_slice().ok_or(TaperError::UnsupportedDType(a.dtype()))?;
    let b_data = b.as_f32_slice().ok_or(TaperError::UnsupportedDType(b.dtype()))?;
    let mut result = vec![0.0f32; numel];

    // Fast path: same shape
    if a.shape() == b.shape() {
        for i in 0..numel {
            result[i] = op(a_data[i], b_data[i]);
        }
    } else {
        // General broadcast path
        for (i, r) in result.iter_mut().enumerate() {
            let a_idx = a.shape().broadcast_index(i, &out_shape);
            let b_idx = b.shape().broadcast_index(i, &out_shape);
            *r = op(a_data[a_idx], b_data[b_idx]);
        }
    }

    Ok(Tensor::from_f32(&result, out_shape.dims()))
}
