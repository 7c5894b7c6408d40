//! The fragment-consumer capability contract (§6).
//!
//! Both the main consumer and the GC consumer implement the same
//! shape. The engine is generic over any type satisfying it — no
//! virtual dispatch is required since Rust monomorphizes generics, but
//! nothing here rules out a `Box<dyn FragmentConsumer<EndOfStream = ()>>`
//! for callers that want runtime polymorphism instead.

use super::fragment::{
    ClusteringRow, DecoratedKey, RangeTombstoneChange, RowTombstone, StaticRow, StopIteration,
    Tombstone,
};

/// A downstream consumer of the compacted fragment stream.
pub trait FragmentConsumer {
    /// What `consume_end_of_stream` hands back — `()` for a consumer
    /// that just observes the stream (e.g. the GC sink), or a richer
    /// value (e.g. a query result) for the main consumer.
    type EndOfStream;

    fn consume_new_partition(&mut self, key: &DecoratedKey);

    fn consume_partition_tombstone(&mut self, tombstone: Tombstone);

    fn consume_static_row(
        &mut self,
        row: StaticRow,
        effective_tombstone: RowTombstone,
        is_live: bool,
    ) -> StopIteration;

    fn consume_clustering_row(
        &mut self,
        row: ClusteringRow,
        effective_tombstone: RowTombstone,
        is_live: bool,
    ) -> StopIteration;

    fn consume_range_tombstone_change(&mut self, change: RangeTombstoneChange) -> StopIteration;

    fn consume_end_of_partition(&mut self) -> StopIteration;

    fn consume_end_of_stream(&mut self) -> Self::EndOfStream;
}

/// A GC consumer that discards everything — used in query mode, where
/// the GC fan-out is disabled (tombstones still shadow data, they are
/// simply never forwarded anywhere as purged garbage).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsumer;

impl FragmentConsumer for NullConsumer {
    type EndOfStream = ();

    fn consume_new_partition(&mut self, _key: &DecoratedKey) {}
    fn consume_partition_tombstone(&mut self, _tombstone: Tombstone) {}

    fn consume_static_row(
        &mut self,
        _row: StaticRow,
        _effective_tombstone: RowTombstone,
        _is_live: bool,
    ) -> StopIteration {
        StopIteration::No
    }

    fn consume_clustering_row(
        &mut self,
        _row: ClusteringRow,
        _effective_tombstone: RowTombstone,
        _is_live: bool,
    ) -> StopIteration {
        StopIteration::No
    }

    fn consume_range_tombstone_change(&mut self, _change: RangeTombstoneChange) -> StopIteration {
        StopIteration::No
    }

    fn consume_end_of_partition(&mut self) -> StopIteration {
        StopIteration::No
    }

    fn consume_end_of_stream(&mut self) -> Self::EndOfStream {}
}
