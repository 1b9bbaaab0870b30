//! User-facing variable handle.

use std::fmt;
use std::sync::Arc;

use taper_core::Tensor;

use crate::backward::run_backward;
use crate::graph::Node;
use crate::{AutogradError, Result};

/// A tracked value: a `Tensor` paired with its computation-graph node.
///
/// `Var` is a cheap handle (`Arc` clone) — cloning it does not copy the
/// underlying data and both clones refer to the same graph node and
/// gradient slot.
#[derive(Clone)]
pub struct Var {
    node: Arc<Node>,
}

impl Var {
    pub(crate) fn from_node(node: Arc<Node>) -> Self {
        Self { node }
    }

    pub(crate) fn node_arc(&self) -> Arc<Node> {
        Arc::clone(&self.node)
    }

    // =========================================================================
    // Leaf construction
    // =========================================================================

    /// Wrap a tensor as a leaf variable.
    pub fn leaf(value: Tensor, requires_grad: bool) -> Self {
        Self::from_node(Node::leaf(value, requires_grad))
    }

    /// Untracked leaf from f32 data.
    pub fn from_f32(data: &[f32], shape: &[usize]) -> Self {
        Self::leaf(Tensor::from_f32(data, shape), false)
    }

    /// Untracked scalar leaf.
    pub fn scalar(value: f32) -> Self {
        Self::leaf(Tensor::scalar(value), false)
    }

    /// Untracked leaf of ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::leaf(Tensor::ones(shape), false)
    }

    /// Untracked leaf of zeros (f32).
    pub fn zeros(shape: &[usize]) -> Self {
        Self::leaf(Tensor::zeros(shape, taper_core::DType::F32), false)
    }

    /// Leaf with standard-normal random values.
    pub fn randn(shape: &[usize], requires_grad: bool) -> Self {
        Self::leaf(Tensor::randn(shape), requires_grad)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// The value this variable holds.
    pub fn value(&self) -> &Tensor {
        self.node.value()
    }

    /// Dimension sizes.
    pub fn dims(&self) -> &[usize] {
        self.value().dims()
    }

    /// Total number of elements.
    pub fn numel(&self) -> usize {
        self.value().numel()
    }

    /// Whether this variable participates in gradient computation.
    pub fn requires_grad(&self) -> bool {
        self.node.requires_grad()
    }

    /// Mutate the tracking flag in place, returning self for chaining.
    pub fn requires_grad_(&self, flag: bool) -> &Self {
        self.node.set_requires_grad(flag);
        self
    }

    /// Whether this is a leaf (user-created or detached) variable.
    pub fn is_leaf(&self) -> bool {
        self.node.is_leaf()
    }

    /// Name of the attached backward rule, or None for leaves and
    /// untracked results.
    pub fn grad_fn_name(&self) -> Option<String> {
        self.node.grad_fn_name()
    }

    // =========================================================================
    // Gradients
    // =========================================================================

    /// Detach from the graph: a new leaf sharing the same storage
    /// (no copy), with tracking disabled and no history.
    pub fn detach(&self) -> Var {
        Self::leaf(self.value().clone(), false)
    }

    /// Accumulated gradient, if any backward pass has populated it.
    pub fn grad(&self) -> Option<Tensor> {
        self.node.grad()
    }

    /// Reset the accumulated gradient to all zeros, in place.
    ///
    /// Fails with `NoGradientYet` if no backward pass has run. Gradients
    /// otherwise accumulate across passes until this is called.
    pub fn zero_grad(&self) -> Result<()> {
        self.node.zero_grad()
    }

    /// Backward pass with a seed of ones; the output must be a scalar.
    pub fn backward(&self) -> Result<()> {
        self.backward_with(None, false)
    }

    /// Backward pass with an explicit seed gradient and retention policy.
    ///
    /// - `seed = None` requires a single-element output and defaults to
    ///   ones; otherwise `InvalidBackwardCall`.
    /// - A supplied seed must match the output shape exactly, else
    ///   `ShapeMismatch`.
    /// - `retain_graph = false` (the default path) frees the graph's
    ///   backward rules as it goes; running again over the same graph
    ///   fails with `GraphAlreadyConsumed`.
    /// - If nothing reachable requires a gradient this is a no-op.
    pub fn backward_with(&self, seed: Option<Tensor>, retain_graph: bool) -> Result<()> {
        let out = self.value();
        let seed = match seed {
            Some(s) => {
                if s.dims() != out.dims() {
                    return Err(AutogradError::ShapeMismatch {
                        expected: out.dims().to_vec(),
                        got: s.dims().to_vec(),
                    });
                }
                s
            }
            None => {
                if out.numel() != 1 {
                    return Err(AutogradError::InvalidBackwardCall);
                }
                Tensor::ones(out.dims())
            }
        };

        if !self.node.requires_grad() {
            // Nothing reachable tracks gradients.
            return Ok(());
        }

        run_backward(&self.node, seed, retain_graph)?;
        Ok(())
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Var(shape={}, requires_grad={}, grad_fn={})",
            self.value().shape(),
            self.requires_grad(),
            self.grad_fn_name().unwrap_or_else(|| "None".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_construction() {
        let x = Var::from_f32(&[1.0, 2.0], &[2]);
        assert!(x.is_leaf());
        assert!(!x.requires_grad());
        assert!(x.grad_fn_name().is_none());
        assert!(x.grad().is_none());
    }

    #[test]
    fn test_requires_grad_chaining() {
        let x = Var::from_f32(&[1.0], &[1]);
        x.requires_grad_(true);
        assert!(x.requires_grad());
        x.requires_grad_(false);
        assert!(!x.requires_grad());
    }

    #[test]
    fn test_detach_shares_storage() {
        let x = Var::randn(&[3], true);
        let d = x.detach();
        assert!(d.value().shares_storage(x.value()));
        assert!(!d.requires_grad());
        assert!(d.is_leaf());
        assert!(d.grad_fn_name().is_none());
    }

    #[test]
    fn test_zero_grad_before_backward() {
        let x = Var::from_f32(&[1.0], &[1]);
        x.requires_grad_(true);
        assert!(matches!(
            x.zero_grad().unwrap_err(),
            AutogradError::NoGradientYet
        ));
    }

    #[test]
    fn test_backward_untracked_is_noop() {
        let x = Var::scalar(3.0);
        x.backward().unwrap();
        assert!(x.grad().is_none());
    }

    #[test]
    fn test_backward_nonscalar_without_seed() {
        let x = Var::from_f32(&[1.0, 2.0], &[2]);
        x.requires_grad_(true);
        assert!(matches!(
            x.backward().unwrap_err(),
            AutogradError::InvalidBackwardCall
        ));
    }

    #[test]
    fn test_backward_seed_shape_mismatch() {
        let x = Var::from_f32(&[1.0, 2.0], &[2]);
        x.requires_grad_(true);
        let err = x
            .backward_with(Some(Tensor::ones(&[3])), false)
            .unwrap_err();
        assert!(matches!(err, AutogradError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_backward_on_leaf_sets_seed_as_grad() {
        let x = Var::scalar(3.0);
        x.requires_grad_(true);
        x.backward().unwrap();
        assert_eq!(x.grad().unwrap().get_f32(0).unwrap(), 1.0);
    }

    #[test]
    fn test_debug_format() {
        let x = Var::from_f32(&[1.0], &[1]);
        let s = format!("{:?}", x);
        assert!(s.contains("grad_fn=None"));
    }
}
