//! Computation graph nodes.
//!
//! A `Node` records one tracked computation: the value it produced,
//! strong references to the nodes that produced its inputs, and the
//! gradient rule that propagates backward through it. Edges only point
//! from consumer to producer, so the graph is a DAG by construction and
//! a node keeps its producers alive for exactly as long as it is itself
//! reachable.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use taper_core::Tensor;

use crate::grad_fn::GradFn;
use crate::Result;

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(0);

fn next_id() -> usize {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A node in the autograd computation graph.
pub struct Node {
    /// Monotonically increasing creation id; stable identity for
    /// accumulator keying and deterministic traversal tie-breaks.
    id: usize,
    /// The value this node produced (owned).
    value: Tensor,
    /// Producers of this node's inputs, in operand order. Empty for leaves.
    inputs: Vec<Arc<Node>>,
    /// Backward rule. Absent for leaves and untracked constants; emptied
    /// when a non-retaining backward pass consumes the graph.
    grad_fn: RwLock<Option<Box<dyn GradFn>>>,
    /// Whether this node was created directly by the user (or detached),
    /// as opposed to being produced by a tracked operation.
    leaf: bool,
    /// Tracking flag; mutable in place via `requires_grad_`.
    requires_grad: AtomicBool,
    /// Persistent accumulated gradient, populated on leaves by backward
    /// passes and kept across passes until explicitly zeroed.
    grad: RwLock<Option<Tensor>>,
    /// Set once a non-retaining backward pass has dropped this node's
    /// grad_fn.
    consumed: AtomicBool,
}

impl Node {
    /// Create a leaf node: user-created value or untracked constant.
    pub fn leaf(value: Tensor, requires_grad: bool) -> Arc<Self> {
        Arc::new(Self {
            id: next_id(),
            value,
            inputs: Vec::new(),
            grad_fn: RwLock::new(None),
            leaf: true,
            requires_grad: AtomicBool::new(requires_grad),
            grad: RwLock::new(None),
            consumed: AtomicBool::new(false),
        })
    }

    /// Create an interior node produced by a tracked operation.
    pub fn interior(value: Tensor, grad_fn: Box<dyn GradFn>, inputs: Vec<Arc<Node>>) -> Arc<Self> {
        Arc::new(Self {
            id: next_id(),
            value,
            inputs,
            grad_fn: RwLock::new(Some(grad_fn)),
            leaf: false,
            requires_grad: AtomicBool::new(true),
            grad: RwLock::new(None),
            consumed: AtomicBool::new(false),
        })
    }

    /// Stable node identity.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The value this node produced.
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Producers of this node's inputs.
    pub fn inputs(&self) -> &[Arc<Node>] {
        &self.inputs
    }

    /// Whether this is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    /// Whether this node participates in gradient computation.
    pub fn requires_grad(&self) -> bool {
        self.requires_grad.load(Ordering::Relaxed)
    }

    /// Mutate the tracking flag in place.
    pub fn set_requires_grad(&self, flag: bool) {
        self.requires_grad.store(flag, Ordering::Relaxed);
    }

    /// Name of the backward rule, if one is currently attached.
    pub fn grad_fn_name(&self) -> Option<String> {
        self.grad_fn.read().as_ref().map(|f| f.name().to_string())
    }

    /// Whether a backward rule is currently attached.
    pub fn has_grad_fn(&self) -> bool {
        self.grad_fn.read().is_some()
    }

    /// Run this node's vjp against an upstream gradient.
    /// `consume` drops the rule afterwards and marks the node consumed.
    pub(crate) fn apply_grad_fn(
        &self,
        grad_output: &Tensor,
        consume: bool,
    ) -> Result<Option<Vec<Option<Tensor>>>> {
        if consume {
            let taken = self.grad_fn.write().take();
            match taken {
                Some(f) => {
                    self.consumed.store(true, Ordering::Relaxed);
                    Ok(Some(f.apply(grad_output)?))
                }
                None => Ok(None),
            }
        } else {
            let guard = self.grad_fn.read();
            match guard.as_ref() {
                Some(f) => Ok(Some(f.apply(grad_output)?)),
                None => Ok(None),
            }
        }
    }

    /// Whether a previous non-retaining backward pass freed this node's
    /// backward rule.
    pub(crate) fn is_consumed(&self) -> bool {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Get the current accumulated gradient.
    pub fn grad(&self) -> Option<Tensor> {
        self.grad.read().clone()
    }

    /// Accumulate a gradient contribution into the persistent slot,
    /// creating it (zero-initialized by the addition identity) if absent.
    pub fn accumulate_grad(&self, grad: &Tensor) -> Result<()> {
        let mut lock = self.grad.write();
        let next = match lock.as_ref() {
            Some(existing) => existing.add(grad)?,
            None => grad.clone(),
        };
        *lock = Some(next);
        Ok(())
    }

    /// Reset the accumulated gradient to all zeros, in place.
    /// Fails if no backward pass has populated the slot yet.
    pub fn zero_grad(&self) -> Result<()> {
        let mut lock = self.grad.write();
        match lock.as_ref() {
            Some(g) => {
                *lock = Some(Tensor::zeros(g.dims(), g.dtype()));
                Ok(())
            }
            None => Err(crate::AutogradError::NoGradientYet),
        }
    }
}
