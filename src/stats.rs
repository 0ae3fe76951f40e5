/// Snapshot of structural counters for one tree.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of leaf splits performed
    pub leaf_splits: u64,
    /// Number of internal node splits performed
    pub internal_splits: u64,
    /// Number of times a new root was created
    pub root_splits: u64,
    /// Number of values appended to an already populated bucket
    pub collisions: u64,
}

impl TreeStats {
    /// Emits the counters to the tracing infrastructure.
    pub fn emit_tracing(&self) {
        tracing::info!(
            target: "bplus_set::stats",
            leaf_splits = self.leaf_splits,
            internal_splits = self.internal_splits,
            root_splits = self.root_splits,
            collisions = self.collisions,
            "bplus tree stats snapshot"
        );
    }
}
