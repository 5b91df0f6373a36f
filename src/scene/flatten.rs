use crate::foundation::core::NodeIdx;
use crate::scene::element::ElementArena;
use std::collections::BTreeSet;

/// Depth-first, pre-order list of every matchable element under the template root.
///
/// Component references appear in place of their guest's root; the guest's descendants are
/// indexed by the guest's own flat tree. The walk does not descend past horizon elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTree {
    nodes: Vec<NodeIdx>,
    generation: u64,
}

impl FlatTree {
    /// Ordered element slots.
    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    /// Monotonic rebuild counter; selector caches are scoped to one generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of flattened elements.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Return `true` when nothing was flattened.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rebuild from the current template shape, bumping the generation.
    pub fn rebuild(&mut self, arena: &ElementArena, horizons: &BTreeSet<NodeIdx>) {
        self.nodes = flatten(arena, horizons);
        self.generation += 1;
        tracing::debug!(
            nodes = self.nodes.len(),
            generation = self.generation,
            "flat tree rebuilt"
        );
    }
}

/// Pure pre-order flattening of `arena` from its root.
pub fn flatten(arena: &ElementArena, horizons: &BTreeSet<NodeIdx>) -> Vec<NodeIdx> {
    let mut out = Vec::new();
    let mut stack = vec![arena.root()];
    while let Some(idx) = stack.pop() {
        let Some(e) = arena.get(idx) else {
            continue;
        };
        if !e.is_matchable() {
            continue;
        }
        out.push(idx);
        if horizons.contains(&idx) {
            continue;
        }
        stack.extend(e.children.iter().rev().copied());
    }
    out
}
