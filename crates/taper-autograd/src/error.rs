use thiserror::Error;

use taper_core::TaperError;

/// Errors raised by the autograd engine.
///
/// All of these are programmer-error conditions raised synchronously at
/// the call that violates the contract; none are retried or recovered
/// internally.
#[derive(Debug, Error)]
pub enum AutogradError {
    /// `backward()` without a seed on an output with more than one
    /// element. Reverse-mode differentiation is only unambiguously
    /// defined from a scalar without a seed.
    #[error("backward() on a non-scalar output requires an explicit seed gradient")]
    InvalidBackwardCall,

    /// The supplied seed gradient does not match the output shape.
    #[error("seed gradient shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    /// A second backward pass ran over a graph whose intermediate state
    /// was freed by a previous non-retaining pass.
    #[error("graph already consumed by a previous backward pass (use retain_graph)")]
    GraphAlreadyConsumed,

    /// `.grad` was zeroed or read destructively before any backward pass
    /// populated it.
    #[error("no gradient accumulated yet")]
    NoGradientYet,

    /// A backend tensor operation failed during forward or backward.
    #[error(transparent)]
    Backend(#[from] TaperError),
}

pub type Result<T> = std::result::Result<T, AutogradError>;
