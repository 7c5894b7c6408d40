//! Schema collaborator interface (§6) and grace-period policy.
//!
//! The real schema metadata service lives outside this crate's scope —
//! these traits are the seam the compactor consumes it through.
//! [`SimpleSchema`] is a minimal in-memory implementation good enough
//! to drive the compactor in tests and examples without a real catalog.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use super::fragment::{ColumnId, DecoratedKey, WallTime};

/// Whether a column participates in the partition key, is static
/// (per-partition), or is a regular clustering-row column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Static,
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub id: ColumnId,
    pub name: String,
    pub kind: ColumnKind,
}

/// The subset of a CQL slice that the compactor's limit/GC-eligibility
/// bookkeeping needs: whether this is a `SELECT DISTINCT` (forces a
/// 1-row-per-partition cap) and whether the query otherwise touches
/// clustering columns at all (affects whether a static-only partition
/// counts as satisfying the query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSlice {
    /// `SELECT DISTINCT` — caps `partition_row_limit` at 1 regardless
    /// of any `LIMIT` clause.
    pub distinct: bool,
    /// Per-partition row cap declared by the slice (e.g. `LIMIT`
    /// applied per-partition, or `usize::MAX` for "no limit").
    pub partition_row_limit: u64,
    /// True when the slice forces static content even on otherwise-empty
    /// rows (e.g. a bare `SELECT static_col FROM t WHERE pk = ?`).
    pub forces_static_content: bool,
    /// True when the row range names at least one clustering-column
    /// restriction (a `SELECT *` with no `WHERE` on clustering columns
    /// has no selector and so is `false`).
    pub has_clustering_selector: bool,
}

impl PartitionSlice {
    pub const ALL: PartitionSlice = PartitionSlice {
        distinct: false,
        partition_row_limit: u64::MAX,
        forces_static_content: false,
        has_clustering_selector: false,
    };

    /// Whether a partition that resolves to "static row only" should
    /// still count as satisfying this slice (§4.1 `consume_new_partition`).
    pub fn returns_static_content_on_empty_rows(&self) -> bool {
        self.forces_static_content || !self.has_clustering_selector
    }

    /// Effective per-partition row cap: 1 for DISTINCT, else the
    /// slice's own limit.
    pub fn effective_partition_row_limit(&self) -> u64 {
        if self.distinct { 1 } else { self.partition_row_limit }
    }
}

/// The schema metadata collaborator: column lookups and the default
/// slice used when a query does not provide one of its own.
pub trait Schema {
    fn column_at(&self, kind: ColumnKind, id: ColumnId) -> Option<ColumnDefinition>;
    fn full_slice(&self) -> PartitionSlice;

    /// A cheap, shared handle to this same schema instance — so a
    /// collaborator the compactor hands a `&dyn Schema` to (e.g. a
    /// `GcPolicy` that wants to stash it for a later lookup) can get its
    /// own `Rc` without re-resolving the schema from a catalog.
    fn shared_self_handle(&self) -> Rc<dyn Schema>;
}

/// The grace-period policy collaborator: maps a key and query time to
/// the `gc_before` cutoff below which tombstones may be discarded.
pub trait GcPolicy {
    fn gc_before_for_key(&self, schema: &dyn Schema, key: &DecoratedKey, query_time: WallTime) -> WallTime;
}

/// A schema backed by a plain in-memory column list, and a grace policy
/// backed by a single fixed duration applied uniformly to every key.
pub struct SimpleSchema {
    columns: BTreeMap<ColumnId, ColumnDefinition>,
    slice: PartitionSlice,
    self_handle: Weak<SimpleSchema>,
}

impl SimpleSchema {
    /// Built behind an `Rc` from the start (rather than handed out bare
    /// and wrapped by the caller) so `shared_self_handle` has a genuine
    /// handle to upgrade rather than needing a second, independent `Rc`.
    pub fn new(columns: Vec<ColumnDefinition>, slice: PartitionSlice) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            columns: columns.into_iter().map(|c| (c.id, c)).collect(),
            slice,
            self_handle: weak.clone(),
        })
    }
}

impl Schema for SimpleSchema {
    fn column_at(&self, kind: ColumnKind, id: ColumnId) -> Option<ColumnDefinition> {
        self.columns
            .get(&id)
            .filter(|c| c.kind == kind)
            .cloned()
    }

    fn full_slice(&self) -> PartitionSlice {
        self.slice
    }

    fn shared_self_handle(&self) -> Rc<dyn Schema> {
        self.self_handle
            .upgrade()
            .expect("SimpleSchema::shared_self_handle called while the schema is being dropped")
    }
}

/// A `gc_before` policy that is a fixed number of nanoseconds before
/// `query_time`, the way `gc_grace_seconds` works in practice.
pub struct FixedGracePeriod {
    pub grace_nanos: i64,
}

impl GcPolicy for FixedGracePeriod {
    fn gc_before_for_key(
        &self,
        _schema: &dyn Schema,
        _key: &DecoratedKey,
        query_time: WallTime,
    ) -> WallTime {
        WallTime(query_time.0.saturating_sub(self.grace_nanos))
    }
}
