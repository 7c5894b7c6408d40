//! Purgeable-timestamp oracle collaborator (§6).
//!
//! Answers, for a given partition key, the maximum write timestamp
//! guaranteed to be shadowed by newer data held *elsewhere* than the
//! SSTable currently being rewritten. Only consulted in SSTable-rewrite
//! mode — see [`crate::mutation_compactor::state::CompactorState::can_gc`].

use super::fragment::DecoratedKey;

pub trait PurgeableOracle {
    /// Timestamps strictly below this value are guaranteed shadowed
    /// elsewhere and may be purged for `key`.
    fn max_purgeable_timestamp(&self, key: &DecoratedKey) -> i64;
}

/// Every tombstone is purgeable — useful for tests of the major-compaction
/// style "nothing else could possibly hold this key" scenario.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPurgeableOracle;

impl PurgeableOracle for AlwaysPurgeableOracle {
    fn max_purgeable_timestamp(&self, _key: &DecoratedKey) -> i64 {
        i64::MAX
    }
}

/// Nothing is purgeable — other SSTables might still hold shadowed data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverPurgeableOracle;

impl PurgeableOracle for NeverPurgeableOracle {
    fn max_purgeable_timestamp(&self, _key: &DecoratedKey) -> i64 {
        i64::MIN
    }
}

/// A fixed cutoff applied uniformly to every key, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedOracle(pub i64);

impl PurgeableOracle for FixedOracle {
    fn max_purgeable_timestamp(&self, _key: &DecoratedKey) -> i64 {
        self.0
    }
}
