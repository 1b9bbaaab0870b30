use std::fmt;

use crate::error::TaperError;
use crate::dtype::DType;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::Result;

/// A multi-dimensional array — the value type flowing through taper.
///
/// Tensors are immutable once created: operations produce new tensors.
/// Storage is shared between views (`reshape`) and clones, with
/// copy-on-write on mutation.
///
/// # Examples
///
/// ```
/// use taper_core::Tensor;
///
/// let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
/// assert_eq!(t.dims(), &[2, 2]);
/// assert_eq!(t.numel(), 4);
///
/// // Zero-copy view
/// let flat = t.reshape(&[4]).unwrap();
/// assert_eq!(flat.dims(), &[4]);
/// ```
#[derive(Clone)]
pub struct Tensor {
    storage: Storage,
    shape: Shape,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Create a tensor from f32 data with the given shape.
    pub fn from_f32(data: &[f32], shape: &[usize]) -> Self {
        let s = Shape::new(shape);
        assert_eq!(
            s.numel(),
            data.len(),
            "shape {:?} requires {} elements, got {}",
            shape,
            s.numel(),
            data.len()
        );
        Self {
            storage: Storage::from_f32(data),
            shape: s,
        }
    }

    /// Create a tensor from f64 data with the given shape.
    pub fn from_f64(data: &[f64], shape: &[usize]) -> Self {
        let s = Shape::new(shape);
        assert_eq!(s.numel(), data.len());
        Self {
            storage: Storage::from_f64(data),
            shape: s,
        }
    }

    /// Create a tensor of zeros with the given shape and dtype.
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        let s = Shape::new(shape);
        Self {
            storage: Storage::zeros(dtype, s.numel()),
            shape: s,
        }
    }

    /// Create a tensor of ones (f32).
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor filled with a constant (f32).
    pub fn full(shape: &[usize], value: f32) -> Self {
        let s = Shape::new(shape);
        let data = vec![value; s.numel()];
        Self::from_f32(&data, shape)
    }

    /// Create a scalar tensor from a single f32 value.
    pub fn scalar(value: f32) -> Self {
        Self {
            storage: Storage::from_f32(&[value]),
            shape: Shape::scalar(),
        }
    }

    /// Create a tensor with random values from standard normal N(0,1).
    pub fn randn(shape: &[usize]) -> Self {
        use rand::Rng;
        let s = Shape::new(shape);
        let numel = s.numel();
        let mut rng = rand::thread_rng();
        // Box-Muller transform for normal distribution
        let data: Vec<f32> = (0..numel)
            .map(|_| {
                let u1: f32 = rng.gen_range(1e-7f32..1.0f32);
                let u2: f32 = rng.gen_range(0.0f32..std::f32::consts::TAU);
                (-2.0 * u1.ln()).sqrt() * u2.cos()
            })
            .collect();
        Self::from_f32(&data, shape)
    }

    /// Create a tensor with values uniformly distributed in [low, high).
    pub fn rand_uniform(shape: &[usize], low: f32, high: f32) -> Self {
        use rand::Rng;
        let s = Shape::new(shape);
        let numel = s.numel();
        let mut rng = rand::thread_rng();
        let data: Vec<f32> = (0..numel).map(|_| rng.gen_range(low..high)).collect();
        Self::from_f32(&data, shape)
    }

    /// Create a tensor from pre-built Storage and shape.
    pub fn from_storage(storage: Storage, shape: &[usize]) -> Result<Self> {
        let s = Shape::new(shape);
        if storage.numel() != s.numel() {
            return Err(TaperError::ShapeMismatch {
                expected: vec![storage.numel()],
                got: shape.to_vec(),
            });
        }
        Ok(Self { storage, shape: s })
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Shape of the tensor.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Dimension sizes as a slice.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Reference to the underlying storage.
    pub fn storage_ref(&self) -> &Storage {
        &self.storage
    }

    /// Whether two tensors share the same underlying buffer.
    pub fn shares_storage(&self, other: &Tensor) -> bool {
        self.storage.ptr_eq(&other.storage)
    }

    // =========================================================================
    // Data access
    // =========================================================================

    /// Get the underlying f32 data as a slice.
    pub fn as_f32_slice(&self) -> Option<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Get a mutable f32 slice (copy-on-write).
    pub fn as_f32_slice_mut(&mut self) -> Option<&mut [f32]> {
        self.storage.as_f32_slice_mut()
    }

    /// Get a single f32 element by flat index.
    pub fn get_f32(&self, flat_index: usize) -> Option<f32> {
        self.storage.as_f32_slice()?.get(flat_index).copied()
    }

    // =========================================================================
    // Shape operations
    // =========================================================================

    /// Reshape the tensor (zero-copy — storage is shared).
    pub fn reshape(&self, new_shape: &[isize]) -> Result<Tensor> {
        let resolved = self.shape.resolve_reshape(new_shape).ok_or_else(|| {
            TaperError::InvalidReshape {
                numel: self.numel(),
                shape: new_shape.iter().map(|&d| d as usize).collect(),
            }
        })?;
        Ok(Tensor {
            storage: self.storage.clone(), // Arc clone — shared data
            shape: resolved,
        })
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tensor(shape={}, dtype={}, numel={})",
            self.shape,
            self.dtype(),
            self.numel(),
        )
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(data) = self.as_f32_slice() {
            if self.numel() <= 20 {
                write!(f, "tensor({:?}, shape={})", data, self.shape)
            } else {
                write!(
                    f,
                    "tensor([{:.4}, {:.4}, ..., {:.4}], shape={})",
                    data[0],
                    data[1],
                    data[self.numel() - 1],
                    self.shape
                )
            }
        } else {
            write!(f, "tensor(shape={}, dtype={})", self.shape, self.dtype())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        assert_eq!(t.dims(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.numel(), 6);
        assert_eq!(t.dtype(), DType::F32);
    }

    #[test]
    fn test_zeros_ones_full() {
        let t = Tensor::zeros(&[3, 4], DType::F32);
        assert!(t.as_f32_slice().unwrap().iter().all(|&v| v == 0.0));

        let t = Tensor::ones(&[2, 2]);
        assert_eq!(t.as_f32_slice().unwrap(), &[1.0, 1.0, 1.0, 1.0]);

        let t = Tensor::full(&[3], 7.5);
        assert_eq!(t.as_f32_slice().unwrap(), &[7.5, 7.5, 7.5]);
    }

    #[test]
    fn test_scalar() {
        let t = Tensor::scalar(3.14);
        assert!(t.shape().is_scalar());
        assert_eq!(t.numel(), 1);
        assert_eq!(t.get_f32(0), Some(3.14));
    }

    #[test]
    fn test_randn_shape() {
        let t = Tensor::randn(&[4, 5]);
        assert_eq!(t.numel(), 20);
        assert_eq!(t.dtype(), DType::F32);
    }

    #[test]
    fn test_reshape_shares_storage() {
        let t = Tensor::from_f32(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let r = t.reshape(&[3, 2]).unwrap();
        assert_eq!(r.dims(), &[3, 2]);
        assert!(t.shares_storage(&r));

        let r = t.reshape(&[-1, 2]).unwrap();
        assert_eq!(r.dims(), &[3, 2]);

        assert!(t.reshape(&[4, 2]).is_err());
    }

    #[test]
    fn test_from_storage_validation() {
        let s = Storage::from_f32(&[1.0, 2.0, 3.0]);
        assert!(Tensor::from_storage(s.clone(), &[3]).is_ok());
        assert!(Tensor::from_storage(s, &[4]).is_err());
    }

    #[test]
    fn test_debug_display() {
        let t = Tensor::from_f32(&[1.0, 2.0], &[2]);
        let debug = format!("{:?}", t);
        assert!(debug.contains("Tensor"));
        assert!(debug.contains("f32"));

        let display = format!("{}", t);
        assert!(display.contains("tensor"));
    }
}
