//! Shared fixtures for the mutation-compactor test suite: a consumer
//! that records every fragment it sees instead of acting on it, plus
//! small builders for the fragment types.

use std::rc::Rc;

use crate::mutation_compactor::{
    Cell, ClusteringKey, ClusteringRow, ColumnDefinition, ColumnKind, DecoratedKey,
    FixedGracePeriod, FragmentConsumer, GcPolicy, RangeTombstoneChange, Row, RowMarker,
    RowTombstone, Schema, SimpleSchema, StaticRow, StopIteration, Tombstone, WallTime,
};

pub fn dk(s: &str) -> DecoratedKey {
    DecoratedKey::new(s.as_bytes().to_vec())
}

pub fn ck(s: &str) -> ClusteringKey {
    ClusteringKey::new(s.as_bytes().to_vec())
}

pub fn t(timestamp: i64, deletion_time: i64) -> Tombstone {
    Tombstone::new(timestamp, WallTime(deletion_time))
}

pub fn cell(value: &str, timestamp: i64) -> Cell {
    Cell::new(value.as_bytes().to_vec(), timestamp)
}

pub fn row_with(cells: &[(u32, &str, i64)]) -> Row {
    let mut row = Row::new();
    for &(id, value, ts) in cells {
        row.set_cell(id, cell(value, ts));
    }
    row
}

pub fn static_row(cells: &[(u32, &str, i64)]) -> StaticRow {
    StaticRow {
        cells: row_with(cells),
    }
}

pub fn live_clustering_row(key: &str, marker_ts: i64, cells: &[(u32, &str, i64)]) -> ClusteringRow {
    ClusteringRow {
        key: ck(key),
        row_tombstone: RowTombstone::none(),
        marker: RowMarker::live(marker_ts),
        cells: row_with(cells),
    }
}

pub fn deleted_clustering_row(key: &str, deletion: Tombstone) -> ClusteringRow {
    ClusteringRow {
        key: ck(key),
        row_tombstone: RowTombstone {
            regular: deletion,
            shadowable: Tombstone::empty(),
        },
        marker: RowMarker::missing(),
        cells: Row::new(),
    }
}

pub fn simple_schema() -> Rc<dyn Schema> {
    SimpleSchema::new(
        vec![
            ColumnDefinition {
                id: 0,
                name: "s0".into(),
                kind: ColumnKind::Static,
            },
            ColumnDefinition {
                id: 1,
                name: "c0".into(),
                kind: ColumnKind::Regular,
            },
            ColumnDefinition {
                id: 2,
                name: "c1".into(),
                kind: ColumnKind::Regular,
            },
        ],
        crate::mutation_compactor::PartitionSlice::ALL,
    )
}

/// A grace period policy that never purges anything (deletion time
/// always lands after `gc_before`) — useful as the default in tests
/// that are not specifically about purging.
pub fn no_grace_period() -> Rc<dyn GcPolicy> {
    Rc::new(FixedGracePeriod { grace_nanos: 0 })
}

/// A grace period wide enough that anything older than `now -
/// grace_nanos` is purgeable.
pub fn grace_period(grace_nanos: i64) -> Rc<dyn GcPolicy> {
    Rc::new(FixedGracePeriod { grace_nanos })
}

/// A grace period so wide `gc_before` sits at or near `WallTime::MIN` —
/// nothing is ever past it, so nothing is ever purged on grace-period
/// grounds alone.
pub fn never_purge_grace() -> Rc<dyn GcPolicy> {
    grace_period(i64::MAX)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NewPartition(DecoratedKey),
    PartitionTombstone(Tombstone),
    StaticRow { row: StaticRow, tombstone: RowTombstone, is_live: bool },
    ClusteringRow { row: ClusteringRow, tombstone: RowTombstone, is_live: bool },
    RangeTombstoneChange(RangeTombstoneChange),
    EndOfPartition,
}

/// Records every fragment handed to it, in order, for assertion.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
    pub events: Vec<Event>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FragmentConsumer for RecordingConsumer {
    type EndOfStream = Vec<Event>;

    fn consume_new_partition(&mut self, key: &DecoratedKey) {
        self.events.push(Event::NewPartition(key.clone()));
    }

    fn consume_partition_tombstone(&mut self, tombstone: Tombstone) {
        self.events.push(Event::PartitionTombstone(tombstone));
    }

    fn consume_static_row(
        &mut self,
        row: StaticRow,
        effective_tombstone: RowTombstone,
        is_live: bool,
    ) -> StopIteration {
        self.events.push(Event::StaticRow {
            row,
            tombstone: effective_tombstone,
            is_live,
        });
        StopIteration::No
    }

    fn consume_clustering_row(
        &mut self,
        row: ClusteringRow,
        effective_tombstone: RowTombstone,
        is_live: bool,
    ) -> StopIteration {
        self.events.push(Event::ClusteringRow {
            row,
            tombstone: effective_tombstone,
            is_live,
        });
        StopIteration::No
    }

    fn consume_range_tombstone_change(&mut self, change: RangeTombstoneChange) -> StopIteration {
        self.events.push(Event::RangeTombstoneChange(change));
        StopIteration::No
    }

    fn consume_end_of_partition(&mut self) -> StopIteration {
        self.events.push(Event::EndOfPartition);
        StopIteration::No
    }

    fn consume_end_of_stream(&mut self) -> Self::EndOfStream {
        std::mem::take(&mut self.events)
    }
}
