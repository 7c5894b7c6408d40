//! Data model for the mutation compactor: fragments, tombstones, rows,
//! and the clustering-space cursor.
//!
//! A partition is a sequence of [`Fragment`]s in ascending
//! [`PositionInPartition`] order: `PartitionStart`, at most one
//! partition tombstone (carried on `PartitionStart`), at most one
//! `StaticRow`, any number of `ClusteringRow`/`RangeTombstoneChange`
//! fragments, then `PartitionEnd`.

use std::collections::BTreeMap;
use std::time::Duration;

// ------------------------------------------------------------------------------------------------
// Primitive identifiers
// ------------------------------------------------------------------------------------------------

/// A partition key together with whatever ordering token the ring uses.
///
/// Only byte-ordering is needed by the compactor itself — token
/// placement is the fragment producer's concern.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecoratedKey(pub Vec<u8>);

impl DecoratedKey {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(key.into())
    }
}

/// Identifier of a column within a schema, stable across fragments.
pub type ColumnId = u32;

/// A clustering key: the ordered tuple of clustering-column values,
/// represented here as their already-comparable encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClusteringKey(pub Vec<u8>);

impl ClusteringKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }
}

// ------------------------------------------------------------------------------------------------
// WallTime
// ------------------------------------------------------------------------------------------------

/// A wall-clock instant, nanoseconds since the UNIX epoch.
///
/// Distinct from a write timestamp: a [`Tombstone`] carries both — a
/// timestamp for precedence ordering and a deletion time for grace
/// period bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WallTime(pub i64);

impl WallTime {
    pub const MIN: WallTime = WallTime(i64::MIN);

    pub fn plus(self, d: Duration) -> WallTime {
        WallTime(self.0.saturating_add(d.as_nanos() as i64))
    }
}

// ------------------------------------------------------------------------------------------------
// Tombstone
// ------------------------------------------------------------------------------------------------

/// A deletion marker: a write timestamp plus the wall-clock time the
/// deletion was issued.
///
/// Ordered by `(timestamp, deletion_time)` — a tombstone `a` is
/// dominated by `b` (`a <= b`) when `b` has an equal-or-later timestamp
/// (ties broken by deletion_time). [`Tombstone::empty`] sorts below
/// every real tombstone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tombstone {
    pub timestamp: i64,
    pub deletion_time: WallTime,
}

impl Tombstone {
    /// The "no deletion" tombstone — dominated by every real tombstone.
    pub const fn empty() -> Self {
        Tombstone {
            timestamp: i64::MIN,
            deletion_time: WallTime::MIN,
        }
    }

    pub fn new(timestamp: i64, deletion_time: WallTime) -> Self {
        Self {
            timestamp,
            deletion_time,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Tombstone::empty()
    }

    /// Returns the later (dominant) of two tombstones.
    pub fn max(a: Tombstone, b: Tombstone) -> Tombstone {
        if a >= b { a } else { b }
    }
}

impl Default for Tombstone {
    fn default() -> Self {
        Tombstone::empty()
    }
}

/// A clustering row's own deletion state: a "regular" row tombstone
/// (normal `DELETE FROM ... WHERE`) plus a "shadowable" one (written by
/// Cassandra/Scylla-style INSERT-implied row markers; dominated by any
/// later write to the row, unlike the regular tombstone).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowTombstone {
    pub regular: Tombstone,
    pub shadowable: Tombstone,
}

impl RowTombstone {
    pub const fn none() -> Self {
        RowTombstone {
            regular: Tombstone::empty(),
            shadowable: Tombstone::empty(),
        }
    }

    pub fn from_partition_tombstone(partition_tombstone: Tombstone) -> Self {
        RowTombstone {
            regular: partition_tombstone,
            shadowable: Tombstone::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.shadowable.is_empty()
    }

    /// The later of the two deletion times — used for grace-period checks.
    pub fn max_deletion_time(&self) -> WallTime {
        self.regular.deletion_time.max(self.shadowable.deletion_time)
    }

    /// The dominant tombstone (regular or shadowable, whichever is
    /// later), used when comparing this row's own deletion against an
    /// enclosing partition/range tombstone.
    pub fn dominant(&self) -> Tombstone {
        Tombstone::max(self.regular, self.shadowable)
    }
}

// ------------------------------------------------------------------------------------------------
// Cells, collections, rows
// ------------------------------------------------------------------------------------------------

/// A single (possibly TTL'd) column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub value: Vec<u8>,
    pub timestamp: i64,
    /// Absolute wall-clock instant this cell expires at, if it carries a TTL.
    pub expiry: Option<WallTime>,
}

impl Cell {
    pub fn new(value: impl Into<Vec<u8>>, timestamp: i64) -> Self {
        Self {
            value: value.into(),
            timestamp,
            expiry: None,
        }
    }

    pub fn with_ttl(value: impl Into<Vec<u8>>, timestamp: i64, expiry: WallTime) -> Self {
        Self {
            value: value.into(),
            timestamp,
            expiry: Some(expiry),
        }
    }

    /// True if this cell's TTL has passed as of `now`.
    pub fn is_expired(&self, now: WallTime) -> bool {
        matches!(self.expiry, Some(e) if now >= e)
    }

    /// True if this cell is shadowed by `tombstone` (its write is no
    /// later than the deletion).
    pub fn is_shadowed_by(&self, tombstone: Tombstone) -> bool {
        self.timestamp <= tombstone.timestamp
    }
}

/// A multi-cell collection column (list/set/map), with its own
/// tombstone (from a full collection overwrite) plus individual cells
/// keyed by the collection's internal ordering key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionMutation {
    pub tombstone: Tombstone,
    pub cells: Vec<(Vec<u8>, Cell)>,
}

impl CollectionMutation {
    pub fn is_empty(&self) -> bool {
        self.tombstone.is_empty() && self.cells.is_empty()
    }
}

/// A single column's live mutation: either a scalar cell or a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Cell(Cell),
    Collection(CollectionMutation),
}

impl ColumnValue {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            ColumnValue::Cell(_) => false,
            ColumnValue::Collection(c) => c.is_empty(),
        }
    }
}

/// A mapping from column to value — the contents of a static row or a
/// clustering row (minus its marker and tombstone, which travel
/// alongside on [`Fragment::ClusteringRow`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: BTreeMap<ColumnId, ColumnValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn set_cell(&mut self, id: ColumnId, cell: Cell) {
        self.columns.insert(id, ColumnValue::Cell(cell));
    }

    pub fn set_collection(&mut self, id: ColumnId, collection: CollectionMutation) {
        self.columns.insert(id, ColumnValue::Collection(collection));
    }

    pub fn get(&self, id: ColumnId) -> Option<&ColumnValue> {
        self.columns.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnId, &ColumnValue)> {
        self.columns.iter().map(|(&id, v)| (id, v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Visits every column, letting `keep` mutate it in place (e.g. to
    /// drop dead sub-cells of a collection) and decide whether the
    /// column survives at all.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(ColumnId, &mut ColumnValue) -> bool) {
        self.columns.retain(|&id, v| keep(id, v));
    }
}

// ------------------------------------------------------------------------------------------------
// Row marker
// ------------------------------------------------------------------------------------------------

/// A clustering row's liveness marker — independent of any column
/// value, the way a bare `INSERT INTO t (pk, ck) VALUES (...)` creates
/// a live row with no regular columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMarker {
    /// `None` means "no marker was ever written" ([`RowMarker::is_missing`]).
    state: Option<MarkerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkerState {
    timestamp: i64,
    expiry: Option<WallTime>,
    /// A marker can itself be a tombstone (row deletion written as a
    /// dead marker) rather than a liveness marker.
    dead: bool,
}

impl RowMarker {
    pub fn missing() -> Self {
        RowMarker { state: None }
    }

    pub fn live(timestamp: i64) -> Self {
        RowMarker {
            state: Some(MarkerState {
                timestamp,
                expiry: None,
                dead: false,
            }),
        }
    }

    pub fn live_with_ttl(timestamp: i64, expiry: WallTime) -> Self {
        RowMarker {
            state: Some(MarkerState {
                timestamp,
                expiry: Some(expiry),
                dead: false,
            }),
        }
    }

    pub fn dead(timestamp: i64) -> Self {
        RowMarker {
            state: Some(MarkerState {
                timestamp,
                expiry: None,
                dead: true,
            }),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.state.is_none()
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.state.map(|s| s.timestamp)
    }

    /// True iff the marker is present, not itself dead, not shadowed by
    /// `tombstone`, and not TTL-expired as of `now`.
    pub fn is_live(&self, tombstone: Tombstone, now: WallTime) -> bool {
        match self.state {
            None => false,
            Some(s) if s.dead => false,
            Some(s) if s.timestamp <= tombstone.timestamp => false,
            Some(s) => !matches!(s.expiry, Some(e) if now >= e),
        }
    }
}

impl Default for RowMarker {
    fn default() -> Self {
        RowMarker::missing()
    }
}

// ------------------------------------------------------------------------------------------------
// PositionInPartition
// ------------------------------------------------------------------------------------------------

/// A totally ordered cursor over a partition's clustering space.
///
/// Ordering: `partition_start < static_row < clustering(k) < after_key(k)
/// < clustering(k')` for any `k' > k`, `< end_of_partition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionInPartition {
    PartitionStart,
    StaticRow,
    Clustering(ClusteringKey),
    /// The position immediately after `key`'s clustering row — used to
    /// anchor a closing range-tombstone change at exactly the point the
    /// last row was seen, without needing a successor key.
    AfterKey(ClusteringKey),
    EndOfPartition,
}

impl PositionInPartition {
    pub fn after_key(key: ClusteringKey) -> Self {
        PositionInPartition::AfterKey(key)
    }

    fn rank(&self) -> u8 {
        match self {
            PositionInPartition::PartitionStart => 0,
            PositionInPartition::StaticRow => 1,
            PositionInPartition::Clustering(_) => 2,
            PositionInPartition::AfterKey(_) => 3,
            PositionInPartition::EndOfPartition => 4,
        }
    }

    fn key(&self) -> Option<&ClusteringKey> {
        match self {
            PositionInPartition::Clustering(k) | PositionInPartition::AfterKey(k) => Some(k),
            _ => None,
        }
    }
}

impl PartialOrd for PositionInPartition {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PositionInPartition {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering::*;

        match (self.key(), other.key()) {
            (Some(a), Some(b)) if a != b => return a.cmp(b),
            _ => {}
        }

        match self.rank().cmp(&other.rank()) {
            Equal => Equal,
            ord => ord,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// Fragments
// ------------------------------------------------------------------------------------------------

/// A static row fragment: the per-partition columns, at most one per
/// partition, logically positioned before any clustering row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRow {
    pub cells: Row,
}

impl StaticRow {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A clustering row fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusteringRow {
    pub key: ClusteringKey,
    pub row_tombstone: RowTombstone,
    pub marker: RowMarker,
    pub cells: Row,
}

impl ClusteringRow {
    pub fn position(&self) -> PositionInPartition {
        PositionInPartition::Clustering(self.key.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.row_tombstone.is_empty() && self.marker.is_missing() && self.cells.is_empty()
    }
}

/// An event opening or closing the active range tombstone at `position`.
///
/// An empty `tombstone` means "close whatever was active here".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTombstoneChange {
    pub position: PositionInPartition,
    pub tombstone: Tombstone,
}

impl RangeTombstoneChange {
    pub fn position(&self) -> PositionInPartition {
        self.position.clone()
    }
}

/// A single item of the fragmented partition stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    PartitionStart {
        key: DecoratedKey,
        partition_tombstone: Tombstone,
    },
    StaticRow(StaticRow),
    ClusteringRow(ClusteringRow),
    RangeTombstoneChange(RangeTombstoneChange),
    PartitionEnd,
}

// ------------------------------------------------------------------------------------------------
// Stats
// ------------------------------------------------------------------------------------------------

/// Liveness counters for one kind of row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveDeadCounts {
    pub live: u64,
    pub dead: u64,
}

impl LiveDeadCounts {
    pub fn record(&mut self, is_live: bool) {
        if is_live {
            self.live += 1;
        } else {
            self.dead += 1;
        }
    }
}

/// Running totals accumulated by a [`crate::mutation_compactor::state::CompactorState`]
/// across the fragments it has consumed since the last [`CompactionStats::reset`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionStats {
    pub partitions: u64,
    pub static_rows: LiveDeadCounts,
    pub clustering_rows: LiveDeadCounts,
    pub range_tombstones: u64,
}

impl CompactionStats {
    pub fn reset(&mut self) {
        *self = CompactionStats::default();
    }
}

// ------------------------------------------------------------------------------------------------
// StopIteration
// ------------------------------------------------------------------------------------------------

/// Whether the caller should stop feeding fragments for the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopIteration {
    No,
    Yes,
}

impl StopIteration {
    pub fn is_stop(self) -> bool {
        matches!(self, StopIteration::Yes)
    }
}

impl From<bool> for StopIteration {
    fn from(stop: bool) -> Self {
        if stop { StopIteration::Yes } else { StopIteration::No }
    }
}

impl std::ops::BitOr for StopIteration {
    type Output = StopIteration;
    fn bitor(self, rhs: Self) -> Self::Output {
        StopIteration::from(self.is_stop() || rhs.is_stop())
    }
}
