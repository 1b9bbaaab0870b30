//! # taper-autograd
//!
//! Reverse-mode automatic differentiation engine for taper.
//!
//! Provides a dynamically built computation graph with:
//! - `Var` — a tracked value handle wrapping a `taper_core::Tensor`
//! - `GradFn` trait for differentiable operations (vector-Jacobian products)
//! - Deterministic reverse-topological backward pass with gradient
//!   accumulation into leaf variables
//! - `NoGradGuard` scope for running forward passes without tracking
//!
//! ```
//! use taper_autograd::Var;
//!
//! let x = Var::from_f32(&[1.0, 2.0, 3.0], &[3]);
//! x.requires_grad_(true);
//! let y = x.add_scalar(2.0).unwrap();
//! let z = y.mul(&y).unwrap().mul_scalar(3.0).unwrap().mean().unwrap();
//! z.backward().unwrap();
//! // dz/dx = 2 * (x + 2)
//! let g = x.grad().unwrap();
//! assert!((g.get_f32(0).unwrap() - 6.0).abs() < 1e-5);
//! ```

pub mod backward;
pub mod error;
pub mod grad_fn;
pub mod graph;
pub mod ops;
pub mod scope;
pub mod var;

pub use error::{AutogradError, Result};
pub use grad_fn::GradFn;
pub use graph::Node;
pub use scope::{is_grad_enabled, NoGradGuard};
pub use var::Var;

// Re-export the backend value type for convenience.
pub use taper_core::Tensor;
