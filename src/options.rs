use crate::error::{Error, Result};

/// Smallest accepted branching factor.
pub const MIN_B: usize = 2;
/// Largest accepted branching factor.
pub const MAX_B: usize = 255;
/// Branching factor used when none is given.
pub const DEFAULT_B: usize = 16;

/// How [`BPlusTree::from_values`](crate::BPlusTree::from_values) builds a tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BulkLoad {
    /// Insert every value one by one, exactly like repeated `insert` calls.
    #[default]
    Sequential,
    /// Sort by hash, then build leaves and internal levels bottom-up.
    Sorted,
}

/// Configuration knobs for a tree.
#[derive(Clone, Debug)]
pub struct BPlusOptions {
    /// Maximum children per internal node (2..=255). Leaves hold up to `b - 1`
    /// entries.
    pub b: usize,
    /// Strategy for building a tree from an initializer sequence.
    pub bulk_load: BulkLoad,
    /// Maximum number of distinct values that may share one hash.
    pub max_bucket_len: usize,
}

impl Default for BPlusOptions {
    fn default() -> Self {
        Self {
            b: DEFAULT_B,
            bulk_load: BulkLoad::Sequential,
            max_bucket_len: u32::MAX as usize,
        }
    }
}

impl BPlusOptions {
    pub fn with_b(mut self, b: usize) -> Self {
        self.b = b;
        self
    }

    pub fn with_bulk_load(mut self, bulk_load: BulkLoad) -> Self {
        self.bulk_load = bulk_load;
        self
    }

    pub fn with_max_bucket_len(mut self, max_bucket_len: usize) -> Self {
        self.max_bucket_len = max_bucket_len;
        self
    }

    /// Checks every knob; called by all constructors before any node exists.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_B..=MAX_B).contains(&self.b) {
            return Err(Error::InvalidBranchingFactor(self.b));
        }
        if self.max_bucket_len == 0 {
            return Err(Error::InvalidOptions(
                "max_bucket_len must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
