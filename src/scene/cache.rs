use crate::foundation::core::NodeIdx;
use crate::foundation::error::MarionetteResult;
use crate::scene::element::ElementArena;
use crate::scene::flatten::FlatTree;
use crate::scene::selector::Selector;
use std::collections::HashMap;

/// Memoized selector → matched elements, scoped to one [`FlatTree`] generation.
///
/// In-place property mutations do not invalidate entries; only a flat-tree rebuild does.
#[derive(Debug, Default)]
pub struct SelectorCache {
    generation: u64,
    parsed: HashMap<String, Selector>,
    matches: HashMap<String, Vec<NodeIdx>>,
}

impl SelectorCache {
    /// Matched elements for `selector`, computing and memoizing on first use in this generation.
    pub fn query(
        &mut self,
        selector: &str,
        arena: &ElementArena,
        flat: &FlatTree,
    ) -> MarionetteResult<&[NodeIdx]> {
        if self.generation != flat.generation() {
            self.clear(flat.generation());
        }
        if !self.matches.contains_key(selector) {
            if !self.parsed.contains_key(selector) {
                self.parsed
                    .insert(selector.to_owned(), Selector::parse(selector)?);
            }
            let found = self.parsed[selector].query(arena, flat.nodes());
            self.matches.insert(selector.to_owned(), found);
        }
        Ok(self.matches[selector].as_slice())
    }

    /// Drop every memoized match and adopt `generation`.
    ///
    /// Parsed selectors survive; they do not depend on the tree.
    pub fn clear(&mut self, generation: u64) {
        self.matches.clear();
        self.generation = generation;
    }

    /// Number of memoized selectors in the current generation.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Return `true` when nothing is memoized.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/cache.rs"]
mod tests;
