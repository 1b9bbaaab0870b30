//! # taper-core
//!
//! CPU tensor backend for the taper autodiff engine.
//!
//! Provides the `Tensor` value type:
//! - F32/F64 dtypes (F32 is the compute type)
//! - Reference-counted storage with copy-on-write mutation
//! - Element-wise arithmetic with NumPy-style broadcasting
//! - Reductions (`sum`, `mean`) to scalar tensors
//!
//! This crate knows nothing about gradients — it only computes forward
//! values. Gradient tracking lives in `taper-autograd`.

pub mod dtype;
pub mod error;
pub mod ops;
pub mod shape;
pub mod storage;
pub mod tensor;
pub mod prelude;

pub use dtype::DType;
pub use error::TaperError;
pub use shape::Shape;
pub use storage::Storage;
pub use tensor::Tensor;

pub type Result<T> = std::result::Result<T, TaperError>;
