//! Garbage Collector Buffer (§4.2).
//!
//! Accumulates the cells, collection mutations, and row tombstone that
//! `CompactorState` strips from a single row during SSTable-rewrite
//! compaction, so they can be forwarded as one synthetic dead fragment
//! to the GC consumer. Scoped to one row at a time; resets itself once
//! drained.

use tracing::trace;

use super::fragment::{
    Cell, ClusteringKey, ClusteringRow, CollectionMutation, ColumnId, Row, RowMarker, RowTombstone,
    StaticRow,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    None,
    Static,
    Clustering(ClusteringKey),
}

/// Per-row scratch space for garbage collected during compaction.
///
/// Allocated once per [`crate::mutation_compactor::state::CompactorState`]
/// in SSTable-rewrite mode and reused across rows — nothing here
/// survives past the row it was collected for.
#[derive(Debug, Default)]
pub struct GarbageCollectorBuffer {
    scope: ScopeState,
    tombstone: RowTombstone,
    marker: RowMarker,
    row: Row,
}

#[derive(Debug, Default)]
struct ScopeState(Option<Scope>);

impl GarbageCollectorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_collecting_static_row(&mut self) {
        self.reset();
        self.scope.0 = Some(Scope::Static);
    }

    pub fn start_collecting_clustering_row(&mut self, key: ClusteringKey) {
        self.reset();
        self.scope.0 = Some(Scope::Clustering(key));
    }

    pub fn collect_row_tombstone(&mut self, tombstone: RowTombstone) {
        trace!(?tombstone, "gc buffer: collecting row tombstone");
        self.tombstone = tombstone;
    }

    pub fn collect_marker(&mut self, marker: RowMarker) {
        self.marker = marker;
    }

    pub fn collect_cell(&mut self, id: ColumnId, cell: Cell) {
        trace!(id, "gc buffer: collecting cell");
        self.row.set_cell(id, cell);
    }

    pub fn collect_collection(&mut self, id: ColumnId, collection: CollectionMutation) {
        trace!(id, "gc buffer: collecting collection");
        self.row.set_collection(id, collection);
    }

    /// True if anything has been collected for the current row.
    pub fn is_empty(&self) -> bool {
        self.tombstone.is_empty() && self.marker.is_missing() && self.row.is_empty()
    }

    /// If non-empty, builds and returns a synthetic dead static row and
    /// resets the buffer. Returns `None` (doing nothing) otherwise.
    pub fn take_static_row(&mut self) -> Option<StaticRow> {
        if self.is_empty() {
            return None;
        }
        let row = StaticRow {
            cells: std::mem::take(&mut self.row),
        };
        self.reset();
        Some(row)
    }

    /// If non-empty, builds and returns a synthetic dead clustering row
    /// and resets the buffer. Returns `None` doing nothing otherwise.
    pub fn take_clustering_row(&mut self) -> Option<ClusteringRow> {
        if self.is_empty() {
            return None;
        }
        let key = match &self.scope.0 {
            Some(Scope::Clustering(k)) => k.clone(),
            _ => {
                debug_assert!(false, "gc buffer drained outside a clustering-row scope");
                ClusteringKey::new(Vec::new())
            }
        };
        let row = ClusteringRow {
            key,
            row_tombstone: self.tombstone,
            marker: self.marker,
            cells: std::mem::take(&mut self.row),
        };
        self.reset();
        Some(row)
    }

    fn reset(&mut self) {
        self.scope.0 = None;
        self.tombstone = RowTombstone::none();
        self.marker = RowMarker::missing();
        self.row = Row::new();
    }
}
