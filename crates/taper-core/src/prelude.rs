//! Convenience re-exports for common taper-core types.
//!
//! ```rust
//! use taper_core::prelude::*;
//! ```

pub use crate::DType;
pub use crate::Result;
pub use crate::Shape;
pub use crate::TaperError;
pub use crate::Tensor;
