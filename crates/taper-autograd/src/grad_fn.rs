//! Gradient function trait and built-in backward rules.
//!
//! Each differentiable primitive carries a `GradFn` describing its
//! vector-Jacobian product: given the gradient flowing into the node's
//! output, produce one gradient contribution per input. Rules never
//! build explicit Jacobians.

use taper_core::{Shape, TaperError, Tensor};

/// Backward rule for one tracked operation.
pub trait GradFn: Send + Sync {
    /// Compute gradients for each input given the output gradient.
    ///
    /// Returns one optional gradient per input, in operand order.
    /// `None` means the input receives no contribution.
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>>;

    /// Name of this gradient function (for debugging).
    fn name(&self) -> &str;
}

/// Sum a gradient back over broadcast axes so its shape matches the
/// operand it belongs to. Identity when no broadcasting happened.
pub(crate) fn reduce_to_shape(grad: &Tensor, dims: &[usize]) -> taper_core::Result<Tensor> {
    if grad.dims() == dims {
        return Ok(grad.clone());
    }
    let g = grad
        .as_f32_slice()
        .ok_or(TaperError::UnsupportedDType(grad.dtype()))?;
    let target = Shape::new(dims);
    let mut out = vec![0.0f32; target.numel()];
    for (i, &v) in g.iter().enumerate() {
        out[target.broadcast_index(i, grad.shape())] += v;
    }
    Ok(Tensor::from_f32(&out, dims))
}

// ============================================================================
// Built-in gradient functions
// ============================================================================

/// Backward for element-wise addition: grad flows through unchanged,
/// reduced over any broadcast axes.
pub struct AddBackward {
    pub lhs_dims: Vec<usize>,
    pub rhs_dims: Vec<usize>,
}

impl GradFn for AddBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![
            Some(reduce_to_shape(grad_output, &self.lhs_dims)?),
            Some(reduce_to_shape(grad_output, &self.rhs_dims)?),
        ])
    }
    fn name(&self) -> &str {
        "AddBackward"
    }
}

/// Backward for element-wise subtraction.
pub struct SubBackward {
    pub lhs_dims: Vec<usize>,
    pub rhs_dims: Vec<usize>,
}

impl GradFn for SubBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        let neg = grad_output.neg()?;
        Ok(vec![
            Some(reduce_to_shape(grad_output, &self.lhs_dims)?),
            Some(reduce_to_shape(&neg, &self.rhs_dims)?),
        ])
    }
    fn name(&self) -> &str {
        "SubBackward"
    }
}

/// Backward for element-wise multiplication.
/// Saves both operand values from the forward pass.
pub struct MulBackward {
    pub lhs: Tensor,
    pub rhs: Tensor,
}

impl GradFn for MulBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        // d/da (a*b) = b, d/db (a*b) = a
        let grad_a = grad_output.mul(&self.rhs)?;
        let grad_b = grad_output.mul(&self.lhs)?;
        Ok(vec![
            Some(reduce_to_shape(&grad_a, self.lhs.dims())?),
            Some(reduce_to_shape(&grad_b, self.rhs.dims())?),
        ])
    }
    fn name(&self) -> &str {
        "MulBackward"
    }
}

/// Backward for element-wise division.
pub struct DivBackward {
    pub lhs: Tensor,
    pub rhs: Tensor,
}

impl GradFn for DivBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        // d/da (a/b) = 1/b, d/db (a/b) = -a/b^2
        let grad_a = grad_output.div(&self.rhs)?;
        let b_sq = self.rhs.mul(&self.rhs)?;
        let grad_b = grad_output.mul(&self.lhs.neg()?.div(&b_sq)?)?;
        Ok(vec![
            Some(reduce_to_shape(&grad_a, self.lhs.dims())?),
            Some(reduce_to_shape(&grad_b, self.rhs.dims())?),
        ])
    }
    fn name(&self) -> &str {
        "DivBackward"
    }
}

/// Backward for negation.
pub struct NegBackward;

impl GradFn for NegBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.neg()?)])
    }
    fn name(&self) -> &str {
        "NegBackward"
    }
}

/// Backward for exp. Saves the forward output: d/dx e^x = e^x.
pub struct ExpBackward {
    pub output: Tensor,
}

impl GradFn for ExpBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.mul(&self.output)?)])
    }
    fn name(&self) -> &str {
        "ExpBackward"
    }
}

/// Backward for log: d/dx ln(x) = 1/x.
pub struct LogBackward {
    pub input: Tensor,
}

impl GradFn for LogBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.div(&self.input)?)])
    }
    fn name(&self) -> &str {
        "LogBackward"
    }
}

/// Backward for elementwise power: d/dx x^n = n * x^(n-1).
pub struct PowBackward {
    pub input: Tensor,
    pub exponent: f32,
}

impl GradFn for PowBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        let inner = self
            .input
            .pow_scalar(self.exponent - 1.0)?
            .mul_scalar(self.exponent)?;
        Ok(vec![Some(grad_output.mul(&inner)?)])
    }
    fn name(&self) -> &str {
        "PowBackward"
    }
}

/// Backward for scalar addition: grad flows through unchanged.
pub struct AddScalarBackward;

impl GradFn for AddScalarBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.clone())])
    }
    fn name(&self) -> &str {
        "AddScalarBackward"
    }
}

/// Backward for scalar multiplication.
pub struct MulScalarBackward {
    pub scalar: f32,
}

impl GradFn for MulScalarBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        Ok(vec![Some(grad_output.mul_scalar(self.scalar)?)])
    }
    fn name(&self) -> &str {
        "MulScalarBackward"
    }
}

/// Backward for sum reduction: broadcast the upstream scalar gradient
/// back to the input shape.
pub struct SumBackward {
    pub input_dims: Vec<usize>,
}

impl GradFn for SumBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        let grad_val = grad_output.get_f32(0).unwrap_or(1.0);
        Ok(vec![Some(Tensor::full(&self.input_dims, grad_val))])
    }
    fn name(&self) -> &str {
        "SumBackward"
    }
}

/// Backward for mean reduction: like sum, divided by element count.
pub struct MeanBackward {
    pub input_dims: Vec<usize>,
}

impl GradFn for MeanBackward {
    fn apply(&self, grad_output: &Tensor) -> taper_core::Result<Vec<Option<Tensor>>> {
        let numel: usize = self.input_dims.iter().product::<usize>().max(1);
        let grad_val = grad_output.get_f32(0).unwrap_or(1.0) / numel as f32;
        Ok(vec![Some(Tensor::full(&self.input_dims, grad_val))])
    }
    fn name(&self) -> &str {
        "MeanBackward"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_backward() {
        let grad = Tensor::from_f32(&[1.0, 2.0, 3.0], &[3]);
        let bw = AddBackward {
            lhs_dims: vec![3],
            rhs_dims: vec![3],
        };
        let grads = bw.apply(&grad).unwrap();
        assert_eq!(grads.len(), 2);
        assert_eq!(
            grads[0].as_ref().unwrap().as_f32_slice().unwrap(),
            &[1.0, 2.0, 3.0]
        );
        assert_eq!(
            grads[1].as_ref().unwrap().as_f32_slice().unwrap(),
            &[1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn test_add_backward_broadcast_reduction() {
        // lhs was [2,3], rhs was [3]: rhs gradient sums over the rows
        let grad = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let bw = AddBackward {
            lhs_dims: vec![2, 3],
            rhs_dims: vec![3],
        };
        let grads = bw.apply(&grad).unwrap();
        assert_eq!(
            grads[1].as_ref().unwrap().as_f32_slice().unwrap(),
            &[5.0, 7.0, 9.0]
        );
    }

    #[test]
    fn test_mul_backward() {
        let a = Tensor::from_f32(&[2.0, 3.0], &[2]);
        let b = Tensor::from_f32(&[4.0, 5.0], &[2]);
        let bw = MulBackward { lhs: a, rhs: b };

        let grad = Tensor::from_f32(&[1.0, 1.0], &[2]);
        let grads = bw.apply(&grad).unwrap();
        // grad_a = grad * b = [4, 5], grad_b = grad * a = [2, 3]
        assert_eq!(grads[0].as_ref().unwrap().as_f32_slice().unwrap(), &[4.0, 5.0]);
        assert_eq!(grads[1].as_ref().unwrap().as_f32_slice().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_div_backward() {
        let a = Tensor::from_f32(&[6.0], &[1]);
        let b = Tensor::from_f32(&[2.0], &[1]);
        let bw = DivBackward { lhs: a, rhs: b };
        let grads = bw.apply(&Tensor::from_f32(&[1.0], &[1])).unwrap();
        // d/da = 1/b = 0.5, d/db = -a/b^2 = -1.5
        assert_eq!(grads[0].as_ref().unwrap().as_f32_slice().unwrap(), &[0.5]);
        assert_eq!(grads[1].as_ref().unwrap().as_f32_slice().unwrap(), &[-1.5]);
    }

    #[test]
    fn test_pow_backward() {
        let bw = PowBackward {
            input: Tensor::from_f32(&[2.0, 3.0], &[2]),
            exponent: 3.0,
        };
        let grads = bw.apply(&Tensor::ones(&[2])).unwrap();
        // 3 * x^2
        assert_eq!(grads[0].as_ref().unwrap().as_f32_slice().unwrap(), &[12.0, 27.0]);
    }

    #[test]
    fn test_sum_backward() {
        let bw = SumBackward {
            input_dims: vec![2, 3],
        };
        let grads = bw.apply(&Tensor::scalar(2.0)).unwrap();
        let g = grads[0].as_ref().unwrap();
        assert_eq!(g.dims(), &[2, 3]);
        assert!(g.as_f32_slice().unwrap().iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_mean_backward() {
        let bw = MeanBackward {
            input_dims: vec![4],
        };
        let grads = bw.apply(&Tensor::scalar(1.0)).unwrap();
        let g = grads[0].as_ref().unwrap();
        assert!(g.as_f32_slice().unwrap().iter().all(|&v| v == 0.25));
    }

    #[test]
    fn test_reduce_to_scalar_shape() {
        let grad = Tensor::from_f32(&[1.0, 2.0, 3.0], &[3]);
        let r = reduce_to_shape(&grad, &[]).unwrap();
        assert!(r.shape().is_scalar());
        assert_eq!(r.get_f32(0).unwrap(), 6.0);
    }
}
