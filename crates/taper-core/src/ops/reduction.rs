//! Reduction operations: sum and mean.

use rayon::prelude::*;

use crate::error::TaperError;
use crate::tensor::Tensor;
use crate::Result;

const PAR_THRESHOLD: usize = 8192;

impl Tensor {
    /// Sum all elements, returning a scalar tensor.
    pub fn sum(&self) -> Result<Tensor> {
        let slice = self
            .as_f32_slice()
            .ok_or(TaperError::UnsupportedDType(self.dtype()))?;
        let total: f32 = if slice.len() >= PAR_THRESHOLD {
            slice.par_iter().sum()
        } else {
            slice.iter().sum()
        };
        Ok(Tensor::scalar(total))
    }

    /// Mean of all elements, returning a scalar tensor.
    pub fn mean(&self) -> Result<Tensor> {
        let s = self.sum()?;
        let n = self.numel() as f32;
        s.mul_scalar(1.0 / n)
    }
}
