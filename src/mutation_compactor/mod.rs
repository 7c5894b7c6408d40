//! Mutation compaction: folding a fragmented partition stream — a
//! partition start, an optional static row, any number of clustering
//! rows and range-tombstone changes, then a partition end — into the
//! single authoritative view a reader or an SSTable rewrite should see.
//!
//! Two collaborating pieces do the work:
//!
//! - [`state::CompactorState`] carries all per-partition bookkeeping
//!   (the active range tombstone, emission history, stats, row/partition
//!   limits) and the `consume_*` operations that apply it to one
//!   fragment at a time.
//! - [`facade::CompactorFacade`] owns a `CompactorState` behind a shared
//!   handle and drives a pair of [`consumer::FragmentConsumer`]s — a
//!   main consumer that sees the live result, and a GC consumer that
//!   sees what was thrown away, forwarded only in SSTable-rewrite mode.
//!
//! [`schema`], [`clock`], and [`oracle`] are the narrow collaborator
//! seams the compactor consumes its environment through, so the engine
//! core stays free of catalog, wall-clock, and cross-SSTable-visibility
//! concerns.

pub mod clock;
pub mod consumer;
pub mod facade;
pub mod fragment;
pub mod gc_buffer;
pub mod oracle;
pub mod schema;
pub mod state;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use consumer::{FragmentConsumer, NullConsumer};
pub use facade::{CompactionCompactor, CompactorFacade, QueryCompactor};
pub use fragment::{
    Cell, ClusteringKey, ClusteringRow, CollectionMutation, ColumnId, ColumnValue,
    CompactionStats, DecoratedKey, Fragment, LiveDeadCounts, PositionInPartition,
    RangeTombstoneChange, Row, RowMarker, RowTombstone, StaticRow, StopIteration, Tombstone,
    WallTime,
};
pub use gc_buffer::GarbageCollectorBuffer;
pub use oracle::{AlwaysPurgeableOracle, FixedOracle, NeverPurgeableOracle, PurgeableOracle};
pub use schema::{
    ColumnDefinition, ColumnKind, FixedGracePeriod, GcPolicy, PartitionSlice, Schema, SimpleSchema,
};
pub use state::{CompactorState, DetachedState};
