//! Shared fixtures for the black-box integration suite: a recording
//! consumer plus small fragment builders, built only on the public
//! `aeternusdb_compactor` API (no internal modules).

#![allow(dead_code)]

use std::rc::Rc;

use aeternusdb_compactor::mutation_compactor::{
    Cell, ClusteringKey, ClusteringRow, ColumnDefinition, ColumnKind, DecoratedKey,
    FixedGracePeriod, Fragment, FragmentConsumer, GcPolicy, PartitionSlice, RangeTombstoneChange,
    Row, RowMarker, RowTombstone, Schema, SimpleSchema, StaticRow, StopIteration, Tombstone,
    WallTime,
};

pub fn dk(s: &str) -> DecoratedKey {
    DecoratedKey::new(s.as_bytes().to_vec())
}

pub fn ck(s: &str) -> ClusteringKey {
    ClusteringKey::new(s.as_bytes().to_vec())
}

pub fn tombstone(timestamp: i64, deletion_time: i64) -> Tombstone {
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

pub fn partition_start(key: &str) -> Fragment {
    Fragment::PartitionStart {
        key: dk(key),
        partition_tombstone: Tombstone::empty(),
    }
}

pub fn partition_start_with_tombstone(key: &str, t: Tombstone) -> Fragment {
    Fragment::PartitionStart {
        key: dk(key),
        partition_tombstone: t,
    }
}

pub fn static_row_fragment(cells: &[(u32, &str, i64)]) -> Fragment {
    Fragment::StaticRow(StaticRow {
        cells: row_with(cells),
    })
}

pub fn live_row(key: &str, marker_ts: i64, cells: &[(u32, &str, i64)]) -> Fragment {
    Fragment::ClusteringRow(ClusteringRow {
        key: ck(key),
        row_tombstone: RowTombstone::none(),
        marker: RowMarker::live(marker_ts),
        cells: row_with(cells),
    })
}

pub fn deleted_row(key: &str, deletion: Tombstone) -> Fragment {
    Fragment::ClusteringRow(ClusteringRow {
        key: ck(key),
        row_tombstone: RowTombstone {
            regular: deletion,
            shadowable: Tombstone::empty(),
        },
        marker: RowMarker::missing(),
        cells: Row::new(),
    })
}

pub fn range_open(key: &str, t: Tombstone) -> Fragment {
    Fragment::RangeTombstoneChange(RangeTombstoneChange {
        position: aeternusdb_compactor::mutation_compactor::PositionInPartition::Clustering(ck(key)),
        tombstone: t,
    })
}

pub fn range_close_after(key: &str) -> Fragment {
    Fragment::RangeTombstoneChange(RangeTombstoneChange {
        position: aeternusdb_compactor::mutation_compactor::PositionInPartition::AfterKey(ck(key)),
        tombstone: Tombstone::empty(),
    })
}

pub fn simple_schema() -> Rc<dyn Schema> {
    SimpleSchema::new(
        vec![
            ColumnDefinition { id: 0, name: "s0".into(), kind: ColumnKind::Static },
            ColumnDefinition { id: 1, name: "c0".into(), kind: ColumnKind::Regular },
        ],
        PartitionSlice::ALL,
    )
}

pub fn no_grace_period() -> Rc<dyn GcPolicy> {
    Rc::new(FixedGracePeriod { grace_nanos: 0 })
}

pub fn never_purge_grace() -> Rc<dyn GcPolicy> {
    Rc::new(FixedGracePeriod { grace_nanos: i64::MAX })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    NewPartition(DecoratedKey),
    PartitionTombstone(Tombstone),
    StaticRow { is_live: bool },
    ClusteringRow { key: ClusteringKey, is_live: bool, tombstone: RowTombstone },
    RangeTombstoneChange(RangeTombstoneChange),
    EndOfPartition,
}

/// Records every fragment handed to it, in order, for assertion. Used as
/// both the main consumer and the GC consumer in these tests.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
    pub events: Vec<Event>,
}

impl RecordingConsumer {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Counts live clustering rows among a consumer's recorded events — a
/// free function rather than a method, since tests typically hold the
/// drained `Vec<Event>` returned from `consume_end_of_stream`, not the
/// consumer itself.
pub fn live_clustering_row_count(events: &[Event]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, Event::ClusteringRow { is_live: true, .. }))
        .count()
}

impl FragmentConsumer for RecordingConsumer {
    type EndOfStream = Vec<Event>;

    fn consume_new_partition(&mut self, key: &DecoratedKey) {
        self.events.push(Event::NewPartition(key.clone()));
    }

    fn consume_partition_tombstone(&mut self, tombstone: Tombstone) {
        self.events.push(Event::PartitionTombstone(tombstone));
    }

    fn consume_static_row(&mut self, _row: StaticRow, _tombstone: RowTombstone, is_live: bool) -> StopIteration {
        self.events.push(Event::StaticRow { is_live });
        StopIteration::No
    }

    fn consume_clustering_row(
        &mut self,
        row: ClusteringRow,
        tombstone: RowTombstone,
        is_live: bool,
    ) -> StopIteration {
        self.events.push(Event::ClusteringRow {
            key: row.key,
            is_live,
            tombstone,
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
