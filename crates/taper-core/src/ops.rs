//! Tensor operations: arithmetic and reductions.
//!
//! All operations return new tensors (functional style); nothing here
//! mutates its inputs.

pub mod arithmetic;
pub mod reduction;
