use crate::foundation::core::InstanceId;
use std::collections::BTreeSet;

/// Process-wide bookkeeping of runtime instances.
///
/// Owned by a [`crate::Runtime`] (or injected through its builder) rather than held in a global,
/// so isolated registries can coexist. Every allocated id is released exactly once.
#[derive(Clone, Debug, Default)]
pub struct InstanceRegistry {
    next: u32,
    live: BTreeSet<InstanceId>,
    released: usize,
}

impl InstanceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh instance id.
    pub fn allocate(&mut self) -> InstanceId {
        let id = InstanceId(self.next);
        self.next += 1;
        self.live.insert(id);
        id
    }

    /// Release `id`. Returns `false` (and logs) if it was not live.
    pub fn release(&mut self, id: InstanceId) -> bool {
        if !self.live.remove(&id) {
            tracing::warn!(instance = %id, "instance released twice or never allocated");
            return false;
        }
        self.released += 1;
        true
    }

    /// Return `true` if `id` is allocated and not yet released.
    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live.contains(&id)
    }

    /// Live instance ids, ascending.
    pub fn live(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.live.iter().copied()
    }

    /// Number of live instances.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of successful releases so far.
    pub fn released_count(&self) -> usize {
        self.released
    }
}
