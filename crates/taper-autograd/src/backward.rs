//! Backward pass execution.
//!
//! Gradients are accumulated in a per-call map keyed by node identity,
//! not written into the graph as the traversal goes: a node's entry must
//! hold the full sum over all of its consumers before its own vjp runs,
//! so the engine walks a true reverse topological order (Kahn's
//! algorithm over consumer counts) rather than a plain BFS. Ties among
//! ready nodes break by creation id, newest first, so traversal order is
//! deterministic.

use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use taper_core::Tensor;

use crate::graph::Node;
use crate::{AutogradError, Result};

/// Run a backward pass from `root`, seeded with `seed`.
///
/// Flushes the resulting gradients into the persistent `.grad` slot of
/// every reachable leaf with `requires_grad`, and returns this pass's
/// per-leaf contributions keyed by node id.
///
/// With `retain_graph = false` each interior node's backward rule is
/// dropped after use; a later pass over the same nodes fails with
/// `GraphAlreadyConsumed`.
pub(crate) fn run_backward(
    root: &Arc<Node>,
    seed: Tensor,
    retain_graph: bool,
) -> Result<HashMap<usize, Tensor>> {
    // Discover the reachable subgraph and count consumers per node.
    let mut nodes: HashMap<usize, Arc<Node>> = HashMap::new();
    let mut consumers: HashMap<usize, usize> = HashMap::new();
    let mut stack = vec![Arc::clone(root)];
    nodes.insert(root.id(), Arc::clone(root));
    consumers.insert(root.id(), 0);

    while let Some(node) = stack.pop() {
        if node.is_consumed() {
            return Err(AutogradError::GraphAlreadyConsumed);
        }
        for input in node.inputs() {
            *consumers.entry(input.id()).or_insert(0) += 1;
            if !nodes.contains_key(&input.id()) {
                nodes.insert(input.id(), Arc::clone(input));
                stack.push(Arc::clone(input));
            }
        }
    }

    let mut acc: HashMap<usize, Tensor> = HashMap::new();
    acc.insert(root.id(), seed);

    // Only the root has no consumer inside the discovered set.
    let mut ready: BinaryHeap<usize> = BinaryHeap::new();
    for (&id, &count) in &consumers {
        if count == 0 {
            ready.push(id);
        }
    }

    while let Some(id) = ready.pop() {
        let node = &nodes[&id];

        // The accumulated entry is complete here: every consumer of this
        // node has already been visited.
        if let Some(grad) = acc.get(&id).cloned() {
            if let Some(input_grads) = node.apply_grad_fn(&grad, !retain_graph)? {
                for (input, maybe_grad) in node.inputs().iter().zip(input_grads) {
                    if let Some(g) = maybe_grad {
                        let next = match acc.get(&input.id()) {
                            Some(existing) => existing.add(&g)?,
                            None => g,
                        };
                        acc.insert(input.id(), next);
                    }
                }
            }
        }

        for input in node.inputs() {
            if let Some(count) = consumers.get_mut(&input.id()) {
                *count -= 1;
                if *count == 0 {
                    ready.push(input.id());
                }
            }
        }
    }

    // Flush into persistent leaf slots.
    let mut leaf_grads = HashMap::new();
    for (id, node) in &nodes {
        if node.is_leaf() && node.requires_grad() {
            if let Some(g) = acc.get(id) {
                node.accumulate_grad(g)?;
                leaf_grads.insert(*id, g.clone());
            }
        }
    }

    Ok(leaf_grads)
}
