use thiserror::Error;

use crate::dtype::DType;

/// Errors produced by the tensor backend.
#[derive(Debug, Error)]
pub enum TaperError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("cannot broadcast shapes {a:?} and {b:?}")]
    BroadcastError { a: Vec<usize>, b: Vec<usize> },

    #[error("dtype mismatch: expected {expected}, got {got}")]
    DTypeMismatch { expected: DType, got: DType },

    #[error("operation not supported for dtype {0}")]
    UnsupportedDType(DType),

    #[error("cannot reshape {numel} elements into {shape:?}")]
    InvalidReshape { numel: usize, shape: Vec<usize> },

    #[error("storage error: {0}")]
    StorageError(String),
}
